use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use log::error;
use sqlx::SqlitePool;

use super::comment_models::{CommentListQuery, CreateCommentRequest, UpdateCommentRequest};
use crate::models::comment::Comment;
use crate::routes::ApiMessage;

pub async fn list_comments(
    pool: web::Data<SqlitePool>,
    query: web::Query<CommentListQuery>,
) -> impl Responder {
    let comments = match query.task_id {
        Some(task_id) => {
            sqlx::query_as::<_, Comment>(
                "SELECT * FROM comments WHERE task_id = ? ORDER BY created_at",
            )
            .bind(task_id)
            .fetch_all(pool.get_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, Comment>("SELECT * FROM comments ORDER BY created_at")
                .fetch_all(pool.get_ref())
                .await
        }
    };

    match comments {
        Ok(comments) => HttpResponse::Ok().json(comments),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to list comments"))
        }
    }
}

pub async fn create_comment(
    pool: web::Data<SqlitePool>,
    req: web::Json<CreateCommentRequest>,
) -> impl Responder {
    if req.body.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiMessage::err("Comment body cannot be empty"));
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
                .json(ApiMessage::err("Failed to create comment"));
        }
    }

    let author_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(req.author_id)
        .fetch_one(pool.get_ref())
        .await;
    match author_exists {
        Ok(0) => return HttpResponse::BadRequest().json(ApiMessage::err("Author does not exist")),
        Ok(_) => {}
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to create comment"));
        }
    }

    let now = Utc::now().naive_utc();
    let result = sqlx::query(
        "INSERT INTO comments (body, author_id, task_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&req.body)
    .bind(req.author_id)
    .bind(req.task_id)
    .bind(now)
    .bind(now)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(r) => HttpResponse::Created().json(Comment {
            id: r.last_insert_rowid(),
            body: req.body.clone(),
            author_id: req.author_id,
            task_id: req.task_id,
            created_at: now,
            updated_at: now,
        }),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to create comment"))
        }
    }
}

pub async fn get_comment(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
        .bind(path.into_inner())
        .fetch_optional(pool.get_ref())
        .await;
    match comment {
        Ok(Some(comment)) => HttpResponse::Ok().json(comment),
        Ok(None) => HttpResponse::NotFound().json(ApiMessage::err("Comment not found")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to fetch comment"))
        }
    }
}

pub async fn update_comment(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    req: web::Json<UpdateCommentRequest>,
) -> impl Responder {
    let comment_id = path.into_inner();

    if req.body.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiMessage::err("Comment body cannot be empty"));
    }

    let result = sqlx::query("UPDATE comments SET body = ?, updated_at = ? WHERE id = ?")
        .bind(&req.body)
        .bind(Utc::now().naive_utc())
        .bind(comment_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(r) if r.rows_affected() == 0 => {
            HttpResponse::NotFound().json(ApiMessage::err("Comment not found"))
        }
        Ok(_) => {
            let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
                .bind(comment_id)
                .fetch_one(pool.get_ref())
                .await;
            match comment {
                Ok(comment) => HttpResponse::Ok().json(comment),
                Err(e) => {
                    error!("Failed to execute query: {}", e);
                    HttpResponse::InternalServerError()
                        .json(ApiMessage::err("Failed to fetch comment"))
                }
            }
        }
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to update comment"))
        }
    }
}

pub async fn delete_comment(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await;
    match result {
        Ok(r) if r.rows_affected() == 0 => {
            HttpResponse::NotFound().json(ApiMessage::err("Comment not found"))
        }
        Ok(_) => HttpResponse::Ok().json(ApiMessage::ok("Comment deleted")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to delete comment"))
        }
    }
}
