use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub author_id: i64,
    pub task_id: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
