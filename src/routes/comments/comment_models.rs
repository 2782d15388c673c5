use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
    pub author_id: i64,
    pub task_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentListQuery {
    pub task_id: Option<i64>,
}
