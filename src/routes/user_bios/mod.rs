pub mod user_bio_handlers;
pub mod user_bio_models;
