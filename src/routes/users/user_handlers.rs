use actix_web::{web, HttpResponse, Responder};
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use log::{error, info};
use sqlx::SqlitePool;

use super::user_models::{CreateUserRequest, UpdateUserRequest};
use crate::cache::{Cache, ALL_USERS_KEY};
use crate::models::user::User;
use crate::routes::ApiMessage;

pub async fn list_users(pool: web::Data<SqlitePool>, cache: web::Data<Cache>) -> impl Responder {
    if let Some(cached) = cache.get(ALL_USERS_KEY) {
        return HttpResponse::Ok().json(cached);
    }

    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY date_joined DESC")
        .fetch_all(pool.get_ref())
        .await;

    match users {
        Ok(users) => match serde_json::to_value(&users) {
            Ok(body) => {
                cache.set(ALL_USERS_KEY, body.clone());
                HttpResponse::Ok().json(body)
            }
            Err(e) => {
                error!("Failed to serialize users: {}", e);
                HttpResponse::InternalServerError().json(ApiMessage::err("Failed to list users"))
            }
        },
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to list users"))
        }
    }
}

pub async fn create_user(
    pool: web::Data<SqlitePool>,
    cache: web::Data<Cache>,
    req: web::Json<CreateUserRequest>,
) -> impl Responder {
    info!("Received request to create user: {}", req.username);

    let taken = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(&req.username)
        .fetch_one(pool.get_ref())
        .await;
    match taken {
        Ok(0) => {}
        Ok(_) => {
            return HttpResponse::BadRequest()
                .json(ApiMessage::err("Username is already taken"));
        }
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to create user"));
        }
    }

    let password_hash = match hash(&req.password, DEFAULT_COST) {
        Ok(h) => h,
        Err(e) => {
            error!("Failed to hash password: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to hash password"));
        }
    };

    let now = Utc::now().naive_utc();
    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, first_name, last_name, is_staff, is_active, date_joined, date_updated) \
         VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(&req.username)
    .bind(&req.email)
    .bind(&password_hash)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(req.is_staff)
    .bind(now)
    .bind(now)
    .execute(pool.get_ref())
    .await;

    let user_id = match result {
        Ok(r) => r.last_insert_rowid(),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to create user"));
        }
    };

    cache.delete(ALL_USERS_KEY);
    fetch_user_response(pool.get_ref(), user_id, true).await
}

pub async fn get_user(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    fetch_user_response(pool.get_ref(), path.into_inner(), false).await
}

pub async fn update_user(
    pool: web::Data<SqlitePool>,
    cache: web::Data<Cache>,
    path: web::Path<i64>,
    req: web::Json<UpdateUserRequest>,
) -> impl Responder {
    let user_id = path.into_inner();

    let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await;
    let user = match existing {
        Ok(Some(user)) => user,
        Ok(None) => return HttpResponse::NotFound().json(ApiMessage::err("User not found")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to update user"));
        }
    };

    let password_hash = match &req.password {
        Some(password) => match hash(password, DEFAULT_COST) {
            Ok(h) => h,
            Err(e) => {
                error!("Failed to hash password: {}", e);
                return HttpResponse::InternalServerError()
                    .json(ApiMessage::err("Failed to hash password"));
            }
        },
        None => user.password_hash.clone(),
    };

    let email = req.email.clone().unwrap_or(user.email);
    let first_name = req.first_name.clone().unwrap_or(user.first_name);
    let last_name = req.last_name.clone().unwrap_or(user.last_name);
    let is_active = req.is_active.unwrap_or(user.is_active);

    let result = sqlx::query(
        "UPDATE users SET email = ?, password_hash = ?, first_name = ?, last_name = ?, is_active = ?, date_updated = ? WHERE id = ?",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(&first_name)
    .bind(&last_name)
    .bind(is_active)
    .bind(Utc::now().naive_utc())
    .bind(user_id)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        error!("Failed to execute query: {}", e);
        return HttpResponse::InternalServerError().json(ApiMessage::err("Failed to update user"));
    }

    cache.delete(ALL_USERS_KEY);
    fetch_user_response(pool.get_ref(), user_id, false).await
}

pub async fn delete_user(
    pool: web::Data<SqlitePool>,
    cache: web::Data<Cache>,
    path: web::Path<i64>,
) -> impl Responder {
    let user_id = path.into_inner();
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(r) if r.rows_affected() == 0 => {
            HttpResponse::NotFound().json(ApiMessage::err("User not found"))
        }
        Ok(_) => {
            info!("User {} deleted", user_id);
            cache.delete(ALL_USERS_KEY);
            HttpResponse::Ok().json(ApiMessage::ok("User deleted"))
        }
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to delete user"))
        }
    }
}

async fn fetch_user_response(pool: &SqlitePool, user_id: i64, created: bool) -> HttpResponse {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await;

    match user {
        Ok(Some(user)) => {
            if created {
                HttpResponse::Created().json(user)
            } else {
                HttpResponse::Ok().json(user)
            }
        }
        Ok(None) => HttpResponse::NotFound().json(ApiMessage::err("User not found")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to fetch user"))
        }
    }
}
