use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ProjectMembership {
    pub id: i64,
    pub user_id: i64,
    pub project_id: i64,
    pub role: Option<String>,
    pub added_on: NaiveDateTime,
}
