use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use log::{error, info};
use sqlx::SqlitePool;

use super::project_models::{
    AddMemberRequest, CreateProjectRequest, ProjectListQuery, UpdateProjectRequest,
};
use crate::models::project::{self, Project};
use crate::models::project_membership::ProjectMembership;
use crate::routes::ApiMessage;

pub async fn list_projects(
    pool: web::Data<SqlitePool>,
    query: web::Query<ProjectListQuery>,
) -> impl Responder {
    let projects = match &query.search {
        Some(term) => {
            let pattern = format!("%{}%", term);
            sqlx::query_as::<_, Project>(
                "SELECT * FROM projects WHERE name LIKE ? OR description LIKE ? ORDER BY id",
            )
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(pool.get_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY id")
                .fetch_all(pool.get_ref())
                .await
        }
    };

    match projects {
        Ok(projects) => HttpResponse::Ok().json(projects),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to list projects"))
        }
    }
}

pub async fn create_project(
    pool: web::Data<SqlitePool>,
    req: web::Json<CreateProjectRequest>,
) -> impl Responder {
    if !project::is_valid_status(&req.status) {
        return HttpResponse::BadRequest().json(ApiMessage::err("Invalid project status"));
    }

    let now = Utc::now().naive_utc();
    let result = sqlx::query(
        "INSERT INTO projects (name, description, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.status)
    .bind(now)
    .bind(now)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(r) => {
            let project_id = r.last_insert_rowid();
            info!("Project {} created", project_id);
            fetch_project_response(pool.get_ref(), project_id, true).await
        }
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to create project"))
        }
    }
}

pub async fn get_project(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    fetch_project_response(pool.get_ref(), path.into_inner(), false).await
}

pub async fn update_project(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    req: web::Json<UpdateProjectRequest>,
) -> impl Responder {
    let project_id = path.into_inner();

    if let Some(status) = &req.status {
        if !project::is_valid_status(status) {
            return HttpResponse::BadRequest().json(ApiMessage::err("Invalid project status"));
        }
    }

    let existing = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
        .bind(project_id)
        .fetch_optional(pool.get_ref())
        .await;
    let project = match existing {
        Ok(Some(project)) => project,
        Ok(None) => return HttpResponse::NotFound().json(ApiMessage::err("Project not found")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to update project"));
        }
    };

    let name = req.name.clone().unwrap_or(project.name);
    let description = req.description.clone().unwrap_or(project.description);
    let status = req.status.clone().unwrap_or(project.status);

    let result = sqlx::query(
        "UPDATE projects SET name = ?, description = ?, status = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&name)
    .bind(&description)
    .bind(&status)
    .bind(Utc::now().naive_utc())
    .bind(project_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => fetch_project_response(pool.get_ref(), project_id, false).await,
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to update project"))
        }
    }
}

pub async fn delete_project(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    let project_id = path.into_inner();
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(project_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(r) if r.rows_affected() == 0 => {
            HttpResponse::NotFound().json(ApiMessage::err("Project not found"))
        }
        Ok(_) => {
            info!("Project {} deleted", project_id);
            HttpResponse::Ok().json(ApiMessage::ok("Project deleted"))
        }
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to delete project"))
        }
    }
}

pub async fn list_members(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    let project_id = path.into_inner();
    let members = sqlx::query_as::<_, ProjectMembership>(
        "SELECT * FROM project_memberships WHERE project_id = ? ORDER BY added_on",
    )
    .bind(project_id)
    .fetch_all(pool.get_ref())
    .await;

    match members {
        Ok(members) => HttpResponse::Ok().json(members),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to list members"))
        }
    }
}

pub async fn add_member(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    req: web::Json<AddMemberRequest>,
) -> impl Responder {
    let project_id = path.into_inner();

    let project_exists =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_one(pool.get_ref())
            .await;
    match project_exists {
        Ok(0) => return HttpResponse::NotFound().json(ApiMessage::err("Project not found")),
        Ok(_) => {}
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to add member"));
        }
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
                .json(ApiMessage::err("Failed to add member"));
        }
    }

    let duplicate = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM project_memberships WHERE user_id = ? AND project_id = ?",
    )
    .bind(req.user_id)
    .bind(project_id)
    .fetch_one(pool.get_ref())
    .await;
    match duplicate {
        Ok(0) => {}
        Ok(_) => {
            return HttpResponse::BadRequest()
                .json(ApiMessage::err("User is already a member of this project"));
        }
        Err(e) => {
            error!("Failed to execute query: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiMessage::err("Failed to add member"));
        }
    }

    let result = sqlx::query(
        "INSERT INTO project_memberships (user_id, project_id, role, added_on) VALUES (?, ?, ?, ?)",
    )
    .bind(req.user_id)
    .bind(project_id)
    .bind(&req.role)
    .bind(Utc::now().naive_utc())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(r) => {
            let membership = sqlx::query_as::<_, ProjectMembership>(
                "SELECT * FROM project_memberships WHERE id = ?",
            )
            .bind(r.last_insert_rowid())
            .fetch_one(pool.get_ref())
            .await;
            match membership {
                Ok(membership) => HttpResponse::Created().json(membership),
                Err(e) => {
                    error!("Failed to execute query: {}", e);
                    HttpResponse::InternalServerError()
                        .json(ApiMessage::err("Failed to fetch membership"))
                }
            }
        }
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to add member"))
        }
    }
}

pub async fn remove_member(
    pool: web::Data<SqlitePool>,
    path: web::Path<(i64, i64)>,
) -> impl Responder {
    let (project_id, user_id) = path.into_inner();
    let result =
        sqlx::query("DELETE FROM project_memberships WHERE project_id = ? AND user_id = ?")
            .bind(project_id)
            .bind(user_id)
            .execute(pool.get_ref())
            .await;

    match result {
        Ok(r) if r.rows_affected() == 0 => {
            HttpResponse::NotFound().json(ApiMessage::err("Membership not found"))
        }
        Ok(_) => HttpResponse::Ok().json(ApiMessage::ok("Member removed")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to remove member"))
        }
    }
}

async fn fetch_project_response(pool: &SqlitePool, project_id: i64, created: bool) -> HttpResponse {
    let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
        .bind(project_id)
        .fetch_optional(pool)
        .await;

    match project {
        Ok(Some(project)) => {
            if created {
                HttpResponse::Created().json(project)
            } else {
                HttpResponse::Ok().json(project)
            }
        }
        Ok(None) => HttpResponse::NotFound().json(ApiMessage::err("Project not found")),
        Err(e) => {
            error!("Failed to execute query: {}", e);
            HttpResponse::InternalServerError().json(ApiMessage::err("Failed to fetch project"))
        }
    }
}
