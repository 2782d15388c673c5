use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUSES: [&str; 3] = ["NEW", "IN_PROGRESS", "DONE"];

/// A task holds at most this many subtasks.
pub const MAX_PER_TASK: i64 = 5;

pub fn is_valid_status(status: &str) -> bool {
    STATUSES.contains(&status)
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Subtask {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub status: String,
    pub task_id: i64,
}
