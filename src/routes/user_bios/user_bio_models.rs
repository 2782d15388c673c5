use serde::Deserialize;

fn default_role() -> String {
    "USER".to_string()
}

#[derive(Debug, Deserialize)]
pub struct UpsertBioRequest {
    pub user_id: i64,
    pub company: String,
    #[serde(default = "default_role")]
    pub role: String,
    pub age: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBioRequest {
    pub company: Option<String>,
    pub role: Option<String>,
    pub age: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BioListQuery {
    pub role: Option<String>,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
}
