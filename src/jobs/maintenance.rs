use chrono::{Duration, NaiveDate, Utc};
use log::info;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::middleware::page_visit::VisitQueue;

/// Batch size for flushing queued page visits into the table.
const VISIT_INSERT_BATCH: usize = 100;

/// Drops BACKLOG and IN_PROGRESS tasks whose due date passed more than
/// `grace_days` ago. DONE tasks are left for archival instead.
pub async fn delete_expired_tasks(
    pool: &SqlitePool,
    grace_days: i64,
) -> Result<u64, sqlx::Error> {
    let cutoff: NaiveDate = Utc::now().date_naive() - Duration::days(grace_days);
    let result = sqlx::query(
        "DELETE FROM tasks WHERE status IN ('BACKLOG', 'IN_PROGRESS') AND due_date < ?",
    )
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

#[derive(FromRow)]
struct ReminderRow {
    id: i64,
    name: String,
    due_date: NaiveDate,
    email: String,
}

/// Finds tasks due tomorrow that are not DONE and emits one reminder per
/// assigned task. Delivery is an infrastructure concern; the reminder is
/// logged here and the count returned for monitoring.
pub async fn send_task_reminders(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    let rows = sqlx::query_as::<_, ReminderRow>(
        "SELECT t.id, t.name, t.due_date, u.email FROM tasks t \
         JOIN users u ON u.id = t.assignee_id \
         WHERE t.due_date = ? AND t.status != 'DONE'",
    )
    .bind(tomorrow)
    .fetch_all(pool)
    .await?;

    for row in &rows {
        info!(
            "Reminder: task {} '{}' is due {} (assignee {})",
            row.id, row.name, row.due_date, row.email
        );
    }
    Ok(rows.len() as u64)
}

/// Moves DONE tasks into the "Archived" category.
pub async fn archive_completed_tasks(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE tasks SET category = 'Archived' WHERE status = 'DONE' AND category != 'Archived'",
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Deletes non-staff users whose last login is older than `inactive_days`.
/// Users who never logged in are kept.
pub async fn delete_inactive_users(
    pool: &SqlitePool,
    inactive_days: i64,
) -> Result<u64, sqlx::Error> {
    let cutoff = Utc::now().naive_utc() - Duration::days(inactive_days);
    let result = sqlx::query(
        "DELETE FROM users WHERE is_staff = 0 AND last_login IS NOT NULL AND last_login < ?",
    )
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Drains the in-process visit queue into the page_visits table in batches.
pub async fn process_page_visits(
    pool: &SqlitePool,
    queue: &VisitQueue,
) -> Result<u64, sqlx::Error> {
    let mut inserted = 0u64;
    loop {
        let batch = queue.drain(VISIT_INSERT_BATCH);
        if batch.is_empty() {
            break;
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO page_visits (user_id, path, ip_address, visited_at) ");
        qb.push_values(batch.iter(), |mut b, visit| {
            b.push_bind(visit.user_id)
                .push_bind(visit.path.clone())
                .push_bind(visit.ip_address.clone())
                .push_bind(visit.visited_at);
        });
        qb.build().execute(pool).await?;
        inserted += batch.len() as u64;
    }
    Ok(inserted)
}

/// Deletes visits older than the retention window, then trims the table
/// down to `max_records` rows, oldest first, in batches of `batch_size`.
pub async fn cleanup_old_visits(
    pool: &SqlitePool,
    retention_days: i64,
    max_records: i64,
    batch_size: i64,
) -> Result<u64, sqlx::Error> {
    let cutoff = Utc::now().naive_utc() - Duration::days(retention_days);
    let expired = sqlx::query("DELETE FROM page_visits WHERE visited_at < ?")
        .bind(cutoff)
        .execute(pool)
        .await?;
    let mut deleted = expired.rows_affected();

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM page_visits")
        .fetch_one(pool)
        .await?;

    let mut excess = total - max_records;
    while excess > 0 {
        let chunk = excess.min(batch_size);
        let result = sqlx::query(
            "DELETE FROM page_visits WHERE id IN \
             (SELECT id FROM page_visits ORDER BY visited_at ASC, id ASC LIMIT ?)",
        )
        .bind(chunk)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            break;
        }
        deleted += result.rows_affected();
        excess -= result.rows_affected() as i64;
    }

    Ok(deleted)
}
