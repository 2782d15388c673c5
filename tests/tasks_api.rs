mod common;

use actix_web::{test, web, App};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use taskhub_backend::cache::Cache;
use taskhub_backend::routes::routes;

macro_rules! test_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(Cache::new()))
                .configure(routes::configure_all),
        )
        .await
    };
}

#[actix_web::test]
async fn create_task_records_history() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let app = test_app!(pool);

    let due = Utc::now().date_naive() + Duration::days(3);
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .set_json(json!({
            "name": "Write report",
            "description": "quarterly numbers",
            "due_date": due.to_string(),
            "project_id": project_id,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "NEW");
    assert_eq!(body["priority"], "1");

    let task_id = body["id"].as_i64().unwrap();
    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}/history", task_id))
        .to_request();
    let history: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["change_reason"], "Task created");
}

#[actix_web::test]
async fn create_task_rejects_past_due_date() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let app = test_app!(pool);

    let due = Utc::now().date_naive() - Duration::days(1);
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .set_json(json!({
            "name": "Late already",
            "description": "",
            "due_date": due.to_string(),
            "project_id": project_id,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn create_task_rejects_duplicate_name_for_same_assignee() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let user_id = common::insert_user(&pool, "alice").await;
    let app = test_app!(pool);

    let due = (Utc::now().date_naive() + Duration::days(2)).to_string();
    let payload = json!({
        "name": "Ship it",
        "description": "",
        "due_date": due,
        "project_id": project_id,
        "assignee_id": user_id,
    });

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .set_json(&payload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .set_json(&payload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn create_task_rejects_invalid_priority_and_status() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let app = test_app!(pool);

    let due = (Utc::now().date_naive() + Duration::days(2)).to_string();
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .set_json(json!({
            "name": "t", "description": "", "due_date": due,
            "project_id": project_id, "priority": "9",
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let due = (Utc::now().date_naive() + Duration::days(2)).to_string();
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .set_json(json!({
            "name": "t", "description": "", "due_date": due,
            "project_id": project_id, "status": "CANCELED",
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn get_task_embeds_subtasks_and_comments() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let user_id = common::insert_user(&pool, "alice").await;
    let due = Utc::now().date_naive() + Duration::days(1);
    let task_id = common::insert_task(&pool, project_id, "t1", "NEW", due, None).await;
    common::insert_subtask(&pool, task_id, "s1").await;
    common::insert_subtask(&pool, task_id, "s2").await;
    common::insert_comment(&pool, task_id, user_id, "looks good").await;
    let app = test_app!(pool);

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "t1");
    assert_eq!(body["subtasks"].as_array().unwrap().len(), 2);
    assert_eq!(body["comments"].as_array().unwrap().len(), 1);
    assert_eq!(body["comments"][0]["body"], "looks good");
}

#[actix_web::test]
async fn update_task_records_field_diff() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let due = Utc::now().date_naive() + Duration::days(1);
    let task_id = common::insert_task(&pool, project_id, "t1", "NEW", due, None).await;
    let app = test_app!(pool);

    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", task_id))
        .set_json(json!({"status": "IN_PROGRESS", "priority": "5"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}/history", task_id))
        .to_request();
    let history: Value = test::call_and_read_body_json(&app, req).await;
    let reason = history[0]["change_reason"].as_str().unwrap();
    assert!(reason.contains("status: 'NEW' -> 'IN_PROGRESS'"));
    assert!(reason.contains("priority: '1' -> '5'"));
}

#[actix_web::test]
async fn update_task_rejects_past_due_date() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let due = Utc::now().date_naive() + Duration::days(1);
    let task_id = common::insert_task(&pool, project_id, "t1", "NEW", due, None).await;
    let app = test_app!(pool);

    let past = Utc::now().date_naive() - Duration::days(10);
    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", task_id))
        .set_json(json!({"due_date": past.to_string()}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // The stored due date is untouched.
    let stored = sqlx::query_scalar::<_, String>("SELECT due_date FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, due.to_string());
}

#[actix_web::test]
async fn change_status_is_case_insensitive_and_validated() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let due = Utc::now().date_naive() + Duration::days(1);
    let task_id = common::insert_task(&pool, project_id, "t1", "NEW", due, None).await;
    let app = test_app!(pool);

    let req = test::TestRequest::post()
        .uri(&format!("/api/tasks/{}/status/done", task_id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let status = sqlx::query_scalar::<_, String>("SELECT status FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "DONE");

    let req = test::TestRequest::post()
        .uri(&format!("/api/tasks/{}/status/bogus", task_id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn overdue_lists_only_open_past_due_tasks() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let yesterday = Utc::now().date_naive() - Duration::days(1);
    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    common::insert_task(&pool, project_id, "open overdue", "NEW", yesterday, None).await;
    common::insert_task(&pool, project_id, "done overdue", "DONE", yesterday, None).await;
    common::insert_task(&pool, project_id, "not due yet", "NEW", tomorrow, None).await;
    let app = test_app!(pool);

    let req = test::TestRequest::get().uri("/api/tasks/overdue").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["open overdue"]);
}

#[actix_web::test]
async fn search_filters_compose() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let soon = Utc::now().date_naive() + Duration::days(3);
    let far = Utc::now().date_naive() + Duration::days(30);
    common::insert_task(&pool, project_id, "fix login bug", "NEW", soon, None).await;
    common::insert_task(&pool, project_id, "fix logout bug", "NEW", far, None).await;
    common::insert_task(&pool, project_id, "write docs", "NEW", soon, None).await;
    let app = test_app!(pool);

    let req = test::TestRequest::get()
        .uri("/api/tasks/search?search_term=bug&due_soon=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["fix login bug"]);
}

#[actix_web::test]
async fn search_matches_high_priority_or_tasks_due_tomorrow() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    let far = Utc::now().date_naive() + Duration::days(30);
    let urgent = common::insert_task(&pool, project_id, "urgent far off", "NEW", far, None).await;
    sqlx::query("UPDATE tasks SET priority = '5' WHERE id = ?")
        .bind(urgent)
        .execute(&pool)
        .await
        .unwrap();
    common::insert_task(&pool, project_id, "due tomorrow", "NEW", tomorrow, None).await;
    common::insert_task(&pool, project_id, "neither", "NEW", far, None).await;
    let app = test_app!(pool);

    let req = test::TestRequest::get()
        .uri("/api/tasks/search?priority_or_due_tomorrow=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["urgent far off", "due tomorrow"]);
}

#[actix_web::test]
async fn list_tasks_paginates() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let due = Utc::now().date_naive() + Duration::days(1);
    for i in 0..12 {
        common::insert_task(&pool, project_id, &format!("task {}", i), "NEW", due, None).await;
    }
    let app = test_app!(pool);

    let req = test::TestRequest::get()
        .uri("/api/tasks?page=2&page_size=5")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 12);
    assert_eq!(body["page"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
    assert_eq!(body["results"][0]["name"], "task 5");
}

#[actix_web::test]
async fn task_writes_invalidate_cached_list() {
    let pool = common::test_pool().await;
    let project_id = common::insert_project(&pool, "alpha").await;
    let due = Utc::now().date_naive() + Duration::days(1);
    let app = test_app!(pool);

    // Prime the cache with an empty first page.
    let req = test::TestRequest::get().uri("/api/tasks").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .set_json(json!({
            "name": "fresh", "description": "", "due_date": due.to_string(),
            "project_id": project_id,
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::get().uri("/api/tasks").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
}
