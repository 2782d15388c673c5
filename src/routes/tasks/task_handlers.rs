use actix_web::{web, HttpResponse, Responder};
use chrono::{Duration, Utc};
use log::{error, info};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::task_models::{
    CreateTaskRequest, TaskDetail, TaskListQuery, TaskPage, TaskSearchQuery, UpdateTaskRequest,
};
use crate::cache::{Cache, ALL_TASKS_KEY};
use crate::models::comment::Comment;
use crate::models::subtask::Subtask;
use crate::models::task::{self, Task};
use crate::models::task_history::TaskHistory;
use crate::routes::ApiMessage;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

pub async fn list_tasks(
    pool: web::Data<SqlitePool>,
    cache: web::Data<Cache>,
    query: web::Query<TaskListQuery>,
) -> impl Responder {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let unfiltered = query.status.is_none()
        && query.priority.is_none()
        && query.project_id.is_none()
        && query.assignee_id.is_none()
        && page == 1
        && page_size == DEFAULT_PAGE_SIZE;

    if unfiltered {
        if let Some(cached) = cache.get(ALL_TASKS_KEY) {
            return HttpResponse::Ok().json(cached);
        }
    }

    let mut count_qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM tasks WHERE 1 = 1");
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM tasks WHERE 1 = 1");
    for builder in [&mut count_qb, &mut qb] {
        if let Some(status) = &query.status {
            builder.push(" AND status = ");
            builder.push_bind(status.clone());
        }
        if let Some(priority) = &query.priority {
            builder.push(" AND priority = ");
            builder.push_bind(priority.clone());
        }
        if let Some(project_id) = query.project_id {
            builder.push(" AND project_id = ");
            builder.push_bind(project_id);
        }
        if let Some(assignee_id) = query.assignee_id {
            builder.push(" AND assignee_id = ");
            builder.push_bind(assignee_id);
        }
    }
    qb.push(" ORDER BY id LIMIT ");
    qb.push_bind(page_size);
    qb.push(" OFFSET ");
    qb.push_bind((page - 1) * page_size);

    let count = match count_qb
        .build_query_scalar::<i64>()
        .fetch_one(pool.get_ref())
        .await
    {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to list tasks"));
        }
    };

    let results = match qb.build_query_as::<Task>().fetch_all(pool.get_ref()).await {
        Ok(results) => results,
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to list tasks"));
        }
    };

    let body = TaskPage {
        count,
        page,
        page_size,
        results,
    };
    match serde_json::to_value(&body) {
        Ok(value) => {
            if unfiltered {
                cache.set(ALL_TASKS_KEY, value.clone());
            }
            HttpResponse::Ok().json(value)
        }
        Err(e) => {
            error!("Failed to serialize tasks: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to list tasks"))
        }
    }
}

pub async fn create_task(
    pool: web::Data<SqlitePool>,
    cache: web::Data<Cache>,
    req: web::Json<CreateTaskRequest>,
) -> impl Responder {
    info!("Received request to create task: {}", req.name);

    if !task::is_valid_status(&req.status) {
        return HttpResponse::BadRequest().json(ApiMessage::err("Invalid task status"));
    }
    if !task::is_valid_priority(&req.priority) {
        return HttpResponse::BadRequest().json(ApiMessage::err("Invalid task priority"));
    }
    if req.due_date < Utc::now().date_naive() {
        return HttpResponse::BadRequest()
            .json(ApiMessage::err("Due date cannot be in the past"));
    }

    let project_exists =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE id = ?")
            .bind(req.project_id)
            .fetch_one(pool.get_ref())
            .await;
    match project_exists {
        Ok(0) => {
            return HttpResponse::BadRequest().json(ApiMessage::err("Project does not exist"))
        }
        Ok(_) => {}
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to create task"));
        }
    }

    match name_taken(pool.get_ref(), req.project_id, &req.name, req.assignee_id, None).await {
        Ok(false) => {}
        Ok(true) => {
            return HttpResponse::BadRequest()
                .json(ApiMessage::err("A task with this name already exists"));
        }
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to create task"));
        }
    }

    let now = Utc::now().naive_utc();
    let result = sqlx::query(
        "INSERT INTO tasks (name, description, status, priority, due_date, category, project_id, assignee_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.status)
    .bind(&req.priority)
    .bind(req.due_date)
    .bind(&req.category)
    .bind(req.project_id)
    .bind(req.assignee_id)
    .bind(now)
    .bind(now)
    .execute(pool.get_ref())
    .await;

    let task_id = match result {
        Ok(r) => r.last_insert_rowid(),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to create task"));
        }
    };

    if let Err(e) = record_history(pool.get_ref(), task_id, "Task created").await {
        error!("Failed to record task history: {}", e);
    }
    cache.delete(ALL_TASKS_KEY);

    let created = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_one(pool.get_ref())
        .await;
    match created {
        Ok(created) => HttpResponse::Created().json(created),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to fetch task"))
        }
    }
}

pub async fn get_task(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    let task_id = path.into_inner();
    let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_optional(pool.get_ref())
        .await;
    let task = match task {
        Ok(Some(task)) => task,
        Ok(None) => return HttpResponse::NotFound().json(ApiMessage::err("Task not found")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to fetch task"));
        }
    };

    let subtasks = sqlx::query_as::<_, Subtask>("SELECT * FROM subtasks WHERE task_id = ? ORDER BY id")
        .bind(task_id)
        .fetch_all(pool.get_ref())
        .await;
    let comments = sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE task_id = ? ORDER BY created_at",
    )
    .bind(task_id)
    .fetch_all(pool.get_ref())
    .await;

    match (subtasks, comments) {
        (Ok(subtasks), Ok(comments)) => HttpResponse::Ok().json(TaskDetail {
            task,
            subtasks,
            comments,
        }),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to fetch task"))
        }
    }
}

pub async fn update_task(
    pool: web::Data<SqlitePool>,
    cache: web::Data<Cache>,
    path: web::Path<i64>,
    req: web::Json<UpdateTaskRequest>,
) -> impl Responder {
    let task_id = path.into_inner();

    if let Some(status) = &req.status {
        if !task::is_valid_status(status) {
            return HttpResponse::BadRequest().json(ApiMessage::err("Invalid task status"));
        }
    }
    if let Some(priority) = &req.priority {
        if !task::is_valid_priority(priority) {
            return HttpResponse::BadRequest().json(ApiMessage::err("Invalid task priority"));
        }
    }
    if let Some(due_date) = req.due_date {
        if due_date < Utc::now().date_naive() {
            return HttpResponse::BadRequest()
                .json(ApiMessage::err("Due date cannot be in the past"));
        }
    }

    let existing = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_optional(pool.get_ref())
        .await;
    let old = match existing {
        Ok(Some(task)) => task,
        Ok(None) => return HttpResponse::NotFound().json(ApiMessage::err("Task not found")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to update task"));
        }
    };

    let name = req.name.clone().unwrap_or_else(|| old.name.clone());
    let description = req
        .description
        .clone()
        .unwrap_or_else(|| old.description.clone());
    let status = req.status.clone().unwrap_or_else(|| old.status.clone());
    let priority = req.priority.clone().unwrap_or_else(|| old.priority.clone());
    let due_date = req.due_date.unwrap_or(old.due_date);
    let category = req.category.clone().unwrap_or_else(|| old.category.clone());
    let assignee_id = match req.assignee_id {
        Some(assignee_id) => Some(assignee_id),
        None => old.assignee_id,
    };

    if name != old.name || assignee_id != old.assignee_id {
        match name_taken(pool.get_ref(), old.project_id, &name, assignee_id, Some(task_id)).await {
            Ok(false) => {}
            Ok(true) => {
                return HttpResponse::BadRequest()
                    .json(ApiMessage::err("A task with this name already exists"));
            }
            Err(e) => {
                error!("Failed to execute query: {}", e);
                return HttpResponse::InternalServerError()
                    .json(ApiMessage::err("Failed to update task"));
            }
        }
    }

    // Human-readable diff recorded alongside the update, updated_at excluded.
    let mut changes = Vec::new();
    if name != old.name {
        changes.push(format!("name: '{}' -> '{}'", old.name, name));
    }
    if description != old.description {
        changes.push("description changed".to_string());
    }
    if status != old.status {
        changes.push(format!("status: '{}' -> '{}'", old.status, status));
    }
    if priority != old.priority {
        changes.push(format!("priority: '{}' -> '{}'", old.priority, priority));
    }
    if due_date != old.due_date {
        changes.push(format!("due_date: '{}' -> '{}'", old.due_date, due_date));
    }
    if category != old.category {
        changes.push(format!("category: '{}' -> '{}'", old.category, category));
    }
    if assignee_id != old.assignee_id {
        changes.push(format!(
            "assignee: {:?} -> {:?}",
            old.assignee_id, assignee_id
        ));
    }

    let result = sqlx::query(
        "UPDATE tasks SET name = ?, description = ?, status = ?, priority = ?, due_date = ?, category = ?, assignee_id = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&name)
    .bind(&description)
    .bind(&status)
    .bind(&priority)
    .bind(due_date)
    .bind(&category)
    .bind(assignee_id)
    .bind(Utc::now().naive_utc())
    .bind(task_id)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        error!("Failed to execute query: {}", e);
        return HttpResponse::InternalServerError().json(ApiMessage::err("Failed to update task"));
    }

    if !changes.is_empty() {
        if let Err(e) = record_history(pool.get_ref(), task_id, &changes.join("; ")).await {
            error!("Failed to record task history: {}", e);
        }
    }
    cache.delete(ALL_TASKS_KEY);

    let updated = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_one(pool.get_ref())
        .await;
    match updated {
        Ok(updated) => HttpResponse::Ok().json(updated),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to fetch task"))
        }
    }
}

pub async fn delete_task(
    pool: web::Data<SqlitePool>,
    cache: web::Data<Cache>,
    path: web::Path<i64>,
) -> impl Responder {
    let task_id = path.into_inner();
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(r) if r.rows_affected() == 0 => {
            HttpResponse::NotFound().json(ApiMessage::err("Task not found"))
        }
        Ok(_) => {
            info!("Task {} deleted", task_id);
            cache.delete(ALL_TASKS_KEY);
            HttpResponse::Ok().json(ApiMessage::ok("Task deleted"))
        }
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to delete task"))
        }
    }
}

pub async fn change_status(
    pool: web::Data<SqlitePool>,
    cache: web::Data<Cache>,
    path: web::Path<(i64, String)>,
) -> impl Responder {
    let (task_id, new_status) = path.into_inner();
    let new_status = new_status.to_uppercase();

    if !task::is_valid_status(&new_status) {
        return HttpResponse::BadRequest().json(ApiMessage::err("Invalid task status"));
    }

    let existing = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_optional(pool.get_ref())
        .await;
    let old = match existing {
        Ok(Some(task)) => task,
        Ok(None) => return HttpResponse::NotFound().json(ApiMessage::err("Task not found")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to change status"));
        }
    };

    let result = sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
        .bind(&new_status)
        .bind(Utc::now().naive_utc())
        .bind(task_id)
        .execute(pool.get_ref())
        .await;

    if let Err(e) = result {
        error!("Failed to execute query: {}", e);
        return HttpResponse::InternalServerError()
            .json(ApiMessage::err("Failed to change status"));
    }

    if old.status != new_status {
        let reason = format!("status: '{}' -> '{}'", old.status, new_status);
        if let Err(e) = record_history(pool.get_ref(), task_id, &reason).await {
            error!("Failed to record task history: {}", e);
        }
    }
    cache.delete(ALL_TASKS_KEY);

    info!("Task {} status set to {}", task_id, new_status);
    HttpResponse::Ok().json(ApiMessage::ok("Status updated"))
}

pub async fn task_history(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    let task_id = path.into_inner();

    let task_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_one(pool.get_ref())
        .await;
    match task_exists {
        Ok(0) => return HttpResponse::NotFound().json(ApiMessage::err("Task not found")),
        Ok(_) => {}
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to fetch history"));
        }
    }

    let history = sqlx::query_as::<_, TaskHistory>(
        "SELECT * FROM task_history WHERE task_id = ? ORDER BY changed_at DESC, id DESC",
    )
    .bind(task_id)
    .fetch_all(pool.get_ref())
    .await;

    match history {
        Ok(history) => HttpResponse::Ok().json(history),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to fetch history"))
        }
    }
}

pub async fn overdue_tasks(pool: web::Data<SqlitePool>) -> impl Responder {
    let today = Utc::now().date_naive();
    let sql = format!(
        "SELECT * FROM tasks WHERE due_date < ? AND status IN ({}) ORDER BY due_date",
        task::OPEN_STATUSES.map(|s| format!("'{}'", s)).join(", ")
    );
    let tasks = sqlx::query_as::<_, Task>(&sql)
        .bind(today)
        .fetch_all(pool.get_ref())
        .await;

    match tasks {
        Ok(tasks) => HttpResponse::Ok().json(tasks),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to list overdue tasks"))
        }
    }
}

pub async fn search_tasks(
    pool: web::Data<SqlitePool>,
    query: web::Query<TaskSearchQuery>,
) -> impl Responder {
    let today = Utc::now().date_naive();
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM tasks WHERE 1 = 1");

    if let Some(term) = &query.search_term {
        let pattern = format!("%{}%", term);
        qb.push(" AND (name LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR description LIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
    if query.due_soon.is_some() {
        qb.push(" AND due_date >= ");
        qb.push_bind(today);
        qb.push(" AND due_date <= ");
        qb.push_bind(today + Duration::days(7));
    }
    if query.high_priority.is_some() {
        qb.push(" AND priority = '5' AND status != 'DONE'");
    }
    if query.priority_or_due_tomorrow.is_some() {
        qb.push(" AND (priority = '5' OR due_date = ");
        qb.push_bind(today + Duration::days(1));
        qb.push(")");
    }
    qb.push(" ORDER BY id");

    match qb.build_query_as::<Task>().fetch_all(pool.get_ref()).await {
        Ok(tasks) => HttpResponse::Ok().json(tasks),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to search tasks"))
        }
    }
}

/// Task names are unique per (project, assignee); unassigned tasks compare
/// against other unassigned tasks in the same project.
async fn name_taken(
    pool: &SqlitePool,
    project_id: i64,
    name: &str,
    assignee_id: Option<i64>,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM tasks WHERE project_id = ");
    qb.push_bind(project_id);
    qb.push(" AND name = ");
    qb.push_bind(name.to_string());
    match assignee_id {
        Some(assignee_id) => {
            qb.push(" AND assignee_id = ");
            qb.push_bind(assignee_id);
        }
        None => {
            qb.push(" AND assignee_id IS NULL");
        }
    }
    if let Some(exclude_id) = exclude_id {
        qb.push(" AND id != ");
        qb.push_bind(exclude_id);
    }

    let count = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(count > 0)
}

async fn record_history(
    pool: &SqlitePool,
    task_id: i64,
    reason: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO task_history (task_id, change_reason, changed_at) VALUES (?, ?, ?)")
        .bind(task_id)
        .bind(reason)
        .bind(Utc::now().naive_utc())
        .execute(pool)
        .await?;
    Ok(())
}
