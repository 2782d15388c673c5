// src/models/mod.rs

pub mod user;
pub mod user_bio;
pub mod project;
pub mod project_membership;
pub mod task;
pub mod subtask;
pub mod comment;
pub mod task_history;
pub mod page_visit;
