use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUSES: [&str; 4] = ["NEW", "BACKLOG", "IN_PROGRESS", "DONE"];
pub const PRIORITIES: [&str; 5] = ["1", "2", "3", "4", "5"];

/// Statuses a task can still be worked in; the overdue listing filters on
/// this set. The expiry job uses a narrower list that leaves NEW tasks
/// alone.
pub const OPEN_STATUSES: [&str; 3] = ["NEW", "BACKLOG", "IN_PROGRESS"];

pub fn is_valid_status(status: &str) -> bool {
    STATUSES.contains(&status)
}

pub fn is_valid_priority(priority: &str) -> bool {
    PRIORITIES.contains(&priority)
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub due_date: NaiveDate,
    pub category: String,
    pub project_id: i64,
    pub assignee_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
