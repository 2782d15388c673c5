use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::comment::Comment;
use crate::models::subtask::Subtask;
use crate::models::task::Task;

fn default_status() -> String {
    "NEW".to_string()
}

fn default_priority() -> String {
    "1".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    pub description: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub category: String,
    pub project_id: i64,
    pub assignee_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
    /// Present means reassign; clearing happens when the user is deleted.
    pub assignee_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub project_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Search flags are presence-based: `?due_soon` and `?due_soon=1` behave
/// the same.
#[derive(Debug, Deserialize)]
pub struct TaskSearchQuery {
    pub search_term: Option<String>,
    pub due_soon: Option<String>,
    pub high_priority: Option<String>,
    pub priority_or_due_tomorrow: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskPage {
    pub count: i64,
    pub page: i64,
    pub page_size: i64,
    pub results: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<Subtask>,
    pub comments: Vec<Comment>,
}
