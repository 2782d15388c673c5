use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use sqlx::SqlitePool;
use tokio::time::MissedTickBehavior;

use super::maintenance;
use crate::config::JobsConfig;
use crate::middleware::page_visit::VisitQueue;

/// Spawns one tokio task per maintenance job. A failing tick is logged and
/// the loop keeps ticking; the store is the source of truth, so re-running
/// a tick later is safe.
pub fn spawn_all(pool: SqlitePool, queue: Arc<VisitQueue>, cfg: JobsConfig) {
    {
        let pool = pool.clone();
        let grace_days = cfg.task_expiry_grace_days;
        spawn_job("delete_expired_tasks", cfg.expire_interval_secs, move || {
            let pool = pool.clone();
            async move { maintenance::delete_expired_tasks(&pool, grace_days).await }
        });
    }
    {
        let pool = pool.clone();
        spawn_job("send_task_reminders", cfg.reminder_interval_secs, move || {
            let pool = pool.clone();
            async move { maintenance::send_task_reminders(&pool).await }
        });
    }
    {
        let pool = pool.clone();
        spawn_job(
            "archive_completed_tasks",
            cfg.archive_interval_secs,
            move || {
                let pool = pool.clone();
                async move { maintenance::archive_completed_tasks(&pool).await }
            },
        );
    }
    {
        let pool = pool.clone();
        let inactive_days = cfg.inactive_user_days;
        spawn_job(
            "delete_inactive_users",
            cfg.inactive_users_interval_secs,
            move || {
                let pool = pool.clone();
                async move { maintenance::delete_inactive_users(&pool, inactive_days).await }
            },
        );
    }
    {
        let pool = pool.clone();
        let queue = queue.clone();
        spawn_job(
            "process_page_visits",
            cfg.visit_flush_interval_secs,
            move || {
                let pool = pool.clone();
                let queue = queue.clone();
                async move { maintenance::process_page_visits(&pool, &queue).await }
            },
        );
    }
    {
        let retention_days = cfg.visit_retention_days;
        let max_records = cfg.visit_max_records;
        let batch_size = cfg.visit_cleanup_batch;
        spawn_job(
            "cleanup_old_visits",
            cfg.visit_cleanup_interval_secs,
            move || {
                let pool = pool.clone();
                async move {
                    maintenance::cleanup_old_visits(&pool, retention_days, max_records, batch_size)
                        .await
                }
            },
        );
    }
}

fn spawn_job<F, Fut>(name: &'static str, interval_secs: u64, mut job: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<u64, sqlx::Error>> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval fires immediately; skip the startup tick
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match job().await {
                Ok(affected) => {
                    if affected > 0 {
                        info!("Job {}: {} row(s) affected", name, affected);
                    }
                }
                Err(e) => error!("Job {} failed: {}", name, e),
            }
        }
    });
}
