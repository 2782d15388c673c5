use serde::Deserialize;

fn default_status() -> String {
    "NEW".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CreateSubtaskRequest {
    pub name: String,
    pub description: String,
    #[serde(default = "default_status")]
    pub status: String,
    pub task_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubtaskRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub task_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SubtaskListQuery {
    pub task_id: Option<i64>,
}
