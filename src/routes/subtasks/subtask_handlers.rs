use actix_web::{web, HttpResponse, Responder};
use log::{error, info};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::subtask_models::{CreateSubtaskRequest, SubtaskListQuery, UpdateSubtaskRequest};
use crate::models::subtask::{self, Subtask, MAX_PER_TASK};
use crate::routes::ApiMessage;

pub async fn list_subtasks(
    pool: web::Data<SqlitePool>,
    query: web::Query<SubtaskListQuery>,
) -> impl Responder {
    let subtasks = match query.task_id {
        Some(task_id) => {
            sqlx::query_as::<_, Subtask>("SELECT * FROM subtasks WHERE task_id = ? ORDER BY id")
                .bind(task_id)
                .fetch_all(pool.get_ref())
                .await
        }
        None => {
            sqlx::query_as::<_, Subtask>("SELECT * FROM subtasks ORDER BY id")
                .fetch_all(pool.get_ref())
                .await
        }
    };

    match subtasks {
        Ok(subtasks) => HttpResponse::Ok().json(subtasks),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to list subtasks"))
        }
    }
}

pub async fn create_subtask(
    pool: web::Data<SqlitePool>,
    req: web::Json<CreateSubtaskRequest>,
) -> impl Responder {
    if !subtask::is_valid_status(&req.status) {
        return HttpResponse::BadRequest().json(ApiMessage::err("Invalid subtask status"));
    }

    let task_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE id = ?")
        .bind(req.task_id)
        .fetch_one(pool.get_ref())
        .await;
    match task_exists {
        Ok(0) => return HttpResponse::BadRequest().json(ApiMessage::err("Task does not exist")),
        Ok(_) => {}
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to create subtask"));
        }
    }

    match name_taken(pool.get_ref(), req.task_id, &req.name, None).await {
        Ok(false) => {}
        Ok(true) => {
            return HttpResponse::BadRequest()
                .json(ApiMessage::err("A subtask with this name already exists"));
        }
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to create subtask"));
        }
    }

    match subtask_count(pool.get_ref(), req.task_id).await {
        Ok(count) if count >= MAX_PER_TASK => {
            info!(
                "Rejected subtask for task {}: already has {} subtasks",
                req.task_id, count
            );
            return HttpResponse::BadRequest().json(ApiMessage::err(
                "Cannot add subtask: the task already has the maximum of 5 subtasks",
            ));
        }
        Ok(_) => {}
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to create subtask"));
        }
    }

    let result =
        sqlx::query("INSERT INTO subtasks (name, description, status, task_id) VALUES (?, ?, ?, ?)")
            .bind(&req.name)
            .bind(&req.description)
            .bind(&req.status)
            .bind(req.task_id)
            .execute(pool.get_ref())
            .await;

    match result {
        Ok(r) => HttpResponse::Created().json(Subtask {
            id: r.last_insert_rowid(),
            name: req.name.clone(),
            description: req.description.clone(),
            status: req.status.clone(),
            task_id: req.task_id,
        }),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to create subtask"))
        }
    }
}

pub async fn get_subtask(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    let subtask = sqlx::query_as::<_, Subtask>("SELECT * FROM subtasks WHERE id = ?")
        .bind(path.into_inner())
        .fetch_optional(pool.get_ref())
        .await;
    match subtask {
        Ok(Some(subtask)) => HttpResponse::Ok().json(subtask),
        Ok(None) => HttpResponse::NotFound().json(ApiMessage::err("Subtask not found")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to fetch subtask"))
        }
    }
}

pub async fn update_subtask(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    req: web::Json<UpdateSubtaskRequest>,
) -> impl Responder {
    let subtask_id = path.into_inner();

    if let Some(status) = &req.status {
        if !subtask::is_valid_status(status) {
            return HttpResponse::BadRequest().json(ApiMessage::err("Invalid subtask status"));
        }
    }

    let existing = sqlx::query_as::<_, Subtask>("SELECT * FROM subtasks WHERE id = ?")
        .bind(subtask_id)
        .fetch_optional(pool.get_ref())
        .await;
    let old = match existing {
        Ok(Some(subtask)) => subtask,
        Ok(None) => return HttpResponse::NotFound().json(ApiMessage::err("Subtask not found")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to update subtask"));
        }
    };

    let task_id = req.task_id.unwrap_or(old.task_id);

    // The cap applies when the subtask moves to a different parent.
    if task_id != old.task_id {
        let task_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE id = ?")
            .bind(task_id)
            .fetch_one(pool.get_ref())
            .await;
        match task_exists {
            Ok(0) => {
                return HttpResponse::BadRequest().json(ApiMessage::err("Task does not exist"))
            }
            Ok(_) => {}
            Err(e) => {
                error!("Failed to execute query: {}", e);
                return HttpResponse::InternalServerError()
                    .json(ApiMessage::err("Failed to update subtask"));
            }
        }
        match subtask_count(pool.get_ref(), task_id).await {
            Ok(count) if count >= MAX_PER_TASK => {
                return HttpResponse::BadRequest().json(ApiMessage::err(
                    "Cannot move subtask: the task already has the maximum of 5 subtasks",
                ));
            }
            Ok(_) => {}
            Err(e) => {
                error!("Failed to execute query: {}", e);
                return HttpResponse::InternalServerError()
                    .json(ApiMessage::err("Failed to update subtask"));
            }
        }
    }

    let name = req.name.clone().unwrap_or_else(|| old.name.clone());

    if name != old.name || task_id != old.task_id {
        match name_taken(pool.get_ref(), task_id, &name, Some(subtask_id)).await {
            Ok(false) => {}
            Ok(true) => {
                return HttpResponse::BadRequest()
                    .json(ApiMessage::err("A subtask with this name already exists"));
            }
            Err(e) => {
                error!("Failed to execute query: {}", e);
                return HttpResponse::InternalServerError()
                    .json(ApiMessage::err("Failed to update subtask"));
            }
        }
    }
    let description = req.description.clone().unwrap_or(old.description);
    let status = req.status.clone().unwrap_or(old.status);

    let result = sqlx::query(
        "UPDATE subtasks SET name = ?, description = ?, status = ?, task_id = ? WHERE id = ?",
    )
    .bind(&name)
    .bind(&description)
    .bind(&status)
    .bind(task_id)
    .bind(subtask_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => HttpResponse::Ok().json(Subtask {
            id: subtask_id,
            name,
            description,
            status,
            task_id,
        }),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to update subtask"))
        }
    }
}

pub async fn delete_subtask(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    let result = sqlx::query("DELETE FROM subtasks WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await;
    match result {
        Ok(r) if r.rows_affected() == 0 => {
            HttpResponse::NotFound().json(ApiMessage::err("Subtask not found"))
        }
        Ok(_) => HttpResponse::Ok().json(ApiMessage::ok("Subtask deleted")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to delete subtask"))
        }
    }
}

/// Subtask names are unique within their parent task.
async fn name_taken(
    pool: &SqlitePool,
    task_id: i64,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM subtasks WHERE task_id = ");
    qb.push_bind(task_id);
    qb.push(" AND name = ");
    qb.push_bind(name.to_string());
    if let Some(exclude_id) = exclude_id {
        qb.push(" AND id != ");
        qb.push_bind(exclude_id);
    }

    let count = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(count > 0)
}

async fn subtask_count(pool: &SqlitePool, task_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subtasks WHERE task_id = ?")
        .bind(task_id)
        .fetch_one(pool)
        .await
}
