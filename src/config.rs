use std::env;

/// Runtime configuration, loaded once at startup from the environment
/// (dotenv is applied by the caller before this runs).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub jobs: JobsConfig,
}

/// Knobs for the periodic maintenance jobs. Intervals are in seconds so
/// tests and local runs can crank them down.
#[derive(Debug, Clone)]
pub struct JobsConfig {
    pub expire_interval_secs: u64,
    pub reminder_interval_secs: u64,
    pub archive_interval_secs: u64,
    pub inactive_users_interval_secs: u64,
    pub visit_flush_interval_secs: u64,
    pub visit_cleanup_interval_secs: u64,
    /// Tasks in BACKLOG/IN_PROGRESS older than this past their due date get deleted.
    pub task_expiry_grace_days: i64,
    /// Users who have not logged in for this long get deleted.
    pub inactive_user_days: i64,
    pub visit_retention_days: i64,
    pub visit_max_records: i64,
    pub visit_cleanup_batch: i64,
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://taskhub.db?mode=rwc".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            jobs: JobsConfig {
                expire_interval_secs: env_u64("JOB_EXPIRE_INTERVAL_SECS", 86_400),
                reminder_interval_secs: env_u64("JOB_REMINDER_INTERVAL_SECS", 60),
                archive_interval_secs: env_u64("JOB_ARCHIVE_INTERVAL_SECS", 60),
                inactive_users_interval_secs: env_u64("JOB_INACTIVE_USERS_INTERVAL_SECS", 86_400),
                visit_flush_interval_secs: env_u64("JOB_VISIT_FLUSH_INTERVAL_SECS", 30),
                visit_cleanup_interval_secs: env_u64("JOB_VISIT_CLEANUP_INTERVAL_SECS", 3_600),
                task_expiry_grace_days: env_i64("TASK_EXPIRY_GRACE_DAYS", 30),
                inactive_user_days: env_i64("INACTIVE_USER_DAYS", 180),
                visit_retention_days: env_i64("VISIT_RETENTION_DAYS", 30),
                visit_max_records: env_i64("VISIT_MAX_RECORDS", 100_000),
                visit_cleanup_batch: env_i64("VISIT_CLEANUP_BATCH", 1_000),
            },
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
