// src/jobs/mod.rs

pub mod maintenance;
pub mod scheduler;
