use actix_web::{web, HttpResponse, Responder};
use log::{error, info};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::user_bio_models::{BioListQuery, UpdateBioRequest, UpsertBioRequest};
use crate::models::user_bio::{self, UserBio};
use crate::routes::ApiMessage;

pub async fn list_bios(
    pool: web::Data<SqlitePool>,
    query: web::Query<BioListQuery>,
) -> impl Responder {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM user_bios WHERE 1 = 1");
    if let Some(role) = &query.role {
        qb.push(" AND role = ");
        qb.push_bind(role.clone());
    }
    if let Some(min_age) = query.min_age {
        qb.push(" AND age >= ");
        qb.push_bind(min_age);
    }
    if let Some(max_age) = query.max_age {
        qb.push(" AND age <= ");
        qb.push_bind(max_age);
    }
    qb.push(" ORDER BY age");

    match qb.build_query_as::<UserBio>().fetch_all(pool.get_ref()).await {
        Ok(bios) => HttpResponse::Ok().json(bios),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to list bios"))
        }
    }
}

/// One bio per user: creates the row on first call, updates it afterwards.
pub async fn upsert_bio(
    pool: web::Data<SqlitePool>,
    req: web::Json<UpsertBioRequest>,
) -> impl Responder {
    if !user_bio::is_valid_role(&req.role) {
        return HttpResponse::BadRequest().json(ApiMessage::err("Invalid role"));
    }

    let user_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(req.user_id)
        .fetch_one(pool.get_ref())
        .await;
    match user_exists {
        Ok(0) => return HttpResponse::BadRequest().json(ApiMessage::err("User does not exist")),
        Ok(_) => {}
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to save bio"));
        }
    }

    let result = sqlx::query(
        "INSERT INTO user_bios (user_id, company, role, age) VALUES (?, ?, ?, ?) \
         ON CONFLICT(user_id) DO UPDATE SET company = excluded.company, role = excluded.role, age = excluded.age",
    )
    .bind(req.user_id)
    .bind(&req.company)
    .bind(&req.role)
    .bind(req.age)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        error!("Failed to execute query: {}", e);
        return HttpResponse::InternalServerError().json(ApiMessage::err("Failed to save bio"));
    }

    info!("Bio saved for user {}", req.user_id);
    let bio = sqlx::query_as::<_, UserBio>("SELECT * FROM user_bios WHERE user_id = ?")
        .bind(req.user_id)
        .fetch_one(pool.get_ref())
        .await;
    match bio {
        Ok(bio) => HttpResponse::Created().json(bio),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to fetch bio"))
        }
    }
}

pub async fn get_bio(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    let bio = sqlx::query_as::<_, UserBio>("SELECT * FROM user_bios WHERE id = ?")
        .bind(path.into_inner())
        .fetch_optional(pool.get_ref())
        .await;
    match bio {
        Ok(Some(bio)) => HttpResponse::Ok().json(bio),
        Ok(None) => HttpResponse::NotFound().json(ApiMessage::err("Bio not found")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to fetch bio"))
        }
    }
}

pub async fn update_bio(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    req: web::Json<UpdateBioRequest>,
) -> impl Responder {
    let bio_id = path.into_inner();

    if let Some(role) = &req.role {
        if !user_bio::is_valid_role(role) {
            return HttpResponse::BadRequest().json(ApiMessage::err("Invalid role"));
        }
    }

    let existing = sqlx::query_as::<_, UserBio>("SELECT * FROM user_bios WHERE id = ?")
        .bind(bio_id)
        .fetch_optional(pool.get_ref())
        .await;
    let bio = match existing {
        Ok(Some(bio)) => bio,
        Ok(None) => return HttpResponse::NotFound().json(ApiMessage::err("Bio not found")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to update bio"));
        }
    };

    let company = req.company.clone().unwrap_or(bio.company);
    let role = req.role.clone().unwrap_or(bio.role);
    let age = req.age.unwrap_or(bio.age);

    let result = sqlx::query("UPDATE user_bios SET company = ?, role = ?, age = ? WHERE id = ?")
        .bind(&company)
        .bind(&role)
        .bind(age)
        .bind(bio_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => HttpResponse::Ok().json(UserBio {
            id: bio_id,
            user_id: bio.user_id,
            company,
            role,
            age,
        }),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to update bio"))
        }
    }
}

pub async fn delete_bio(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    let result = sqlx::query("DELETE FROM user_bios WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await;
    match result {
        Ok(r) if r.rows_affected() == 0 => {
            HttpResponse::NotFound().json(ApiMessage::err("Bio not found"))
        }
        Ok(_) => HttpResponse::Ok().json(ApiMessage::ok("Bio deleted")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to delete bio"))
        }
    }
}
