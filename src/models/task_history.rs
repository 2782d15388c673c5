use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One entry per create, update or status change on a task, newest first
/// when listed.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct TaskHistory {
    pub id: i64,
    pub task_id: i64,
    pub change_reason: String,
    pub changed_at: NaiveDateTime,
}
