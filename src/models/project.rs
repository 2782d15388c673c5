use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUSES: [&str; 3] = ["NEW", "IN_PROGRESS", "DONE"];

pub fn is_valid_status(status: &str) -> bool {
    STATUSES.contains(&status)
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
