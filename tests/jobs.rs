mod common;

use chrono::{Duration, Utc};

use taskhub_backend::jobs::maintenance;
use taskhub_backend::middleware::page_visit::{VisitQueue, VisitRecord};
use taskhub_backend::models::page_visit::PageVisit;

#[actix_web::test]
async fn delete_expired_tasks_only_touches_stale_open_tasks() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let stale = Utc::now().date_naive() - Duration::days(40);
    let recent = Utc::now().date_naive() - Duration::days(5);

    common::insert_task(&pool, project_id, "stale backlog", "BACKLOG", stale, None).await;
    common::insert_task(&pool, project_id, "stale in progress", "IN_PROGRESS", stale, None).await;
    common::insert_task(&pool, project_id, "stale done", "DONE", stale, None).await;
    common::insert_task(&pool, project_id, "stale new", "NEW", stale, None).await;
    common::insert_task(&pool, project_id, "recent backlog", "BACKLOG", recent, None).await;

    let deleted = maintenance::delete_expired_tasks(&pool, 30).await.unwrap();
    assert_eq!(deleted, 2);

    let names = sqlx::query_scalar::<_, String>("SELECT name FROM tasks ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(names, vec!["stale done", "stale new", "recent backlog"]);
}

#[actix_web::test]
async fn reminders_cover_tomorrows_unfinished_assigned_tasks() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let user_id = common::insert_user(&pool, "alice").await;
    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    let next_week = Utc::now().date_naive() + Duration::days(7);

    common::insert_task(&pool, project_id, "due tomorrow", "NEW", tomorrow, Some(user_id)).await;
    common::insert_task(&pool, project_id, "done tomorrow", "DONE", tomorrow, Some(user_id)).await;
    common::insert_task(&pool, project_id, "unassigned", "NEW", tomorrow, None).await;
    common::insert_task(&pool, project_id, "due later", "NEW", next_week, Some(user_id)).await;

    let reminded = maintenance::send_task_reminders(&pool).await.unwrap();
    assert_eq!(reminded, 1);
}

#[actix_web::test]
async fn archive_marks_done_tasks_once() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let due = Utc::now().date_naive() + Duration::days(1);
    common::insert_task(&pool, project_id, "done", "DONE", due, None).await;
    common::insert_task(&pool, project_id, "open", "NEW", due, None).await;

    let archived = maintenance::archive_completed_tasks(&pool).await.unwrap();
    assert_eq!(archived, 1);

    let category = sqlx::query_scalar::<_, String>("SELECT category FROM tasks WHERE name = 'done'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(category, "Archived");
    let untouched = sqlx::query_scalar::<_, String>("SELECT category FROM tasks WHERE name = 'open'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(untouched, "");

    // Second run finds nothing new.
    let archived = maintenance::archive_completed_tasks(&pool).await.unwrap();
    assert_eq!(archived, 0);
}

#[actix_web::test]
async fn inactive_user_cleanup_spares_staff_and_fresh_logins() {
    let pool = common::test_pool().await;
    let old_login = Utc::now().naive_utc() - Duration::days(200);
    let fresh_login = Utc::now().naive_utc() - Duration::days(10);

    common::insert_user_full(&pool, "dormant", false, Some(old_login)).await;
    common::insert_user_full(&pool, "dormant_staff", true, Some(old_login)).await;
    common::insert_user_full(&pool, "active", false, Some(fresh_login)).await;
    common::insert_user_full(&pool, "never_logged_in", false, None).await;

    let deleted = maintenance::delete_inactive_users(&pool, 180).await.unwrap();
    assert_eq!(deleted, 1);

    let usernames = sqlx::query_scalar::<_, String>("SELECT username FROM users ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(usernames, vec!["dormant_staff", "active", "never_logged_in"]);
}

#[actix_web::test]
async fn visit_flush_drains_the_queue_in_batches() {
    let pool = common::test_pool().await;
    let queue = VisitQueue::new();
    for i in 0..250 {
        queue.push(VisitRecord {
            user_id: if i % 2 == 0 { Some(i) } else { None },
            path: format!("/page/{}", i),
            ip_address: Some("10.0.0.1".to_string()),
            visited_at: Utc::now().naive_utc(),
        });
    }

    let inserted = maintenance::process_page_visits(&pool, &queue).await.unwrap();
    assert_eq!(inserted, 250);
    assert!(queue.is_empty());
    assert_eq!(common::count(&pool, "page_visits").await, 250);

    // Record contents survive the flush intact.
    let rows = sqlx::query_as::<_, PageVisit>("SELECT * FROM page_visits ORDER BY id LIMIT 2")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(rows[0].path, "/page/0");
    assert_eq!(rows[0].user_id, Some(0));
    assert_eq!(rows[0].ip_address.as_deref(), Some("10.0.0.1"));
    assert_eq!(rows[1].path, "/page/1");
    assert_eq!(rows[1].user_id, None);
}

#[actix_web::test]
async fn visit_cleanup_applies_retention_and_cap() {
    let pool = common::test_pool().await;
    let now = Utc::now().naive_utc();

    // 3 expired, 10 recent.
    for i in 0..3 {
        common::insert_visit(&pool, &format!("/old/{}", i), now - Duration::days(60)).await;
    }
    for i in 0..10 {
        common::insert_visit(&pool, &format!("/new/{}", i), now - Duration::minutes(i)).await;
    }

    let deleted = maintenance::cleanup_old_visits(&pool, 30, 6, 2).await.unwrap();
    // 3 expired plus 4 trimmed over the cap of 6.
    assert_eq!(deleted, 7);
    assert_eq!(common::count(&pool, "page_visits").await, 6);

    // The oldest of the recent rows were the ones trimmed.
    let remaining = sqlx::query_scalar::<_, String>(
        "SELECT path FROM page_visits ORDER BY visited_at ASC LIMIT 1",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(remaining, "/new/5");
}

#[actix_web::test]
async fn cleanup_is_a_noop_under_the_cap() {
    let pool = common::test_pool().await;
    let now = Utc::now().naive_utc();
    for i in 0..4 {
        common::insert_visit(&pool, &format!("/p/{}", i), now).await;
    }

    let deleted = maintenance::cleanup_old_visits(&pool, 30, 100, 10).await.unwrap();
    assert_eq!(deleted, 0);
    assert_eq!(common::count(&pool, "page_visits").await, 4);
}
