// src/middleware/mod.rs

pub mod page_visit;
