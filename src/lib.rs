pub mod cache;
pub mod config;
pub mod db;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod routes;
