#![allow(dead_code)]

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use taskhub_backend::db;

/// Single-connection in-memory pool so every query sees the same database.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    db::init_schema(&pool).await.unwrap();
    pool
}

pub async fn insert_user(pool: &SqlitePool, username: &str) -> i64 {
    insert_user_full(pool, username, false, None).await
}

pub async fn insert_user_full(
    pool: &SqlitePool,
    username: &str,
    is_staff: bool,
    last_login: Option<NaiveDateTime>,
) -> i64 {
    let now = Utc::now().naive_utc();
    sqlx::query(
        "INSERT INTO users (username, email, password_hash, first_name, last_name, is_staff, is_active, last_login, date_joined, date_updated) \
         VALUES (?, ?, 'x', '', '', ?, 1, ?, ?, ?)",
    )
    .bind(username)
    .bind(format!("{}@example.com", username))
    .bind(is_staff)
    .bind(last_login)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn insert_project(pool: &SqlitePool, name: &str) -> i64 {
    let now = Utc::now().naive_utc();
    sqlx::query(
        "INSERT INTO projects (name, description, status, created_at, updated_at) VALUES (?, '', 'NEW', ?, ?)",
    )
    .bind(name)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn insert_task(
    pool: &SqlitePool,
    project_id: i64,
    name: &str,
    status: &str,
    due_date: NaiveDate,
    assignee_id: Option<i64>,
) -> i64 {
    let now = Utc::now().naive_utc();
    sqlx::query(
        "INSERT INTO tasks (name, description, status, priority, due_date, category, project_id, assignee_id, created_at, updated_at) \
         VALUES (?, '', ?, '1', ?, '', ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(status)
    .bind(due_date)
    .bind(project_id)
    .bind(assignee_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn insert_subtask(pool: &SqlitePool, task_id: i64, name: &str) -> i64 {
    sqlx::query("INSERT INTO subtasks (name, description, status, task_id) VALUES (?, '', 'NEW', ?)")
        .bind(name)
        .bind(task_id)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn insert_comment(pool: &SqlitePool, task_id: i64, author_id: i64, body: &str) -> i64 {
    let now = Utc::now().naive_utc();
    sqlx::query(
        "INSERT INTO comments (body, author_id, task_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(body)
    .bind(author_id)
    .bind(task_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn insert_visit(pool: &SqlitePool, path: &str, visited_at: NaiveDateTime) -> i64 {
    sqlx::query("INSERT INTO page_visits (user_id, path, ip_address, visited_at) VALUES (NULL, ?, NULL, ?)")
        .bind(path)
        .bind(visited_at)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}
