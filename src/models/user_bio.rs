use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLES: [&str; 5] = ["ADMIN", "USER", "MANAGER", "DEVELOPER", "CEO"];

pub fn is_valid_role(role: &str) -> bool {
    ROLES.contains(&role)
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct UserBio {
    pub id: i64,
    pub user_id: i64,
    pub company: String,
    pub role: String,
    pub age: i64,
}
