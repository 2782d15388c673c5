// src/routes/mod.rs

pub mod routes;

pub mod users;
pub mod user_bios;
pub mod projects;
pub mod tasks;
pub mod subtasks;
pub mod comments;

use serde::{Deserialize, Serialize};

/// Shared success/failure envelope for responses that carry no entity body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    pub fn ok(message: impl Into<String>) -> ApiMessage {
        ApiMessage {
            success: true,
            message: message.into(),
        }
    }

    pub fn err(message: impl Into<String>) -> ApiMessage {
        ApiMessage {
            success: false,
            message: message.into(),
        }
    }
}
