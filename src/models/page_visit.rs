use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct PageVisit {
    pub id: i64,
    pub user_id: Option<i64>,
    pub path: String,
    pub ip_address: Option<String>,
    pub visited_at: NaiveDateTime,
}
