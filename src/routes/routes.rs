use actix_web::web;

use super::comments::comment_handlers;
use super::projects::project_handlers;
use super::subtasks::subtask_handlers;
use super::tasks::task_handlers;
use super::user_bios::user_bio_handlers;
use super::users::user_handlers;

/// Registers every API scope; main and the integration tests share this.
pub fn configure_all(cfg: &mut web::ServiceConfig) {
    users_configure(cfg);
    user_bios_configure(cfg);
    projects_configure(cfg);
    tasks_configure(cfg);
    subtasks_configure(cfg);
    comments_configure(cfg);
}

pub fn users_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .route("", web::get().to(user_handlers::list_users))
            .route("", web::post().to(user_handlers::create_user))
            .route("/{id}", web::get().to(user_handlers::get_user))
            .route("/{id}", web::put().to(user_handlers::update_user))
            .route("/{id}", web::delete().to(user_handlers::delete_user)),
    );
}

pub fn user_bios_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/userbios")
            .route("", web::get().to(user_bio_handlers::list_bios))
            .route("", web::post().to(user_bio_handlers::upsert_bio))
            .route("/{id}", web::get().to(user_bio_handlers::get_bio))
            .route("/{id}", web::put().to(user_bio_handlers::update_bio))
            .route("/{id}", web::delete().to(user_bio_handlers::delete_bio)),
    );
}

pub fn projects_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/projects")
            .route("", web::get().to(project_handlers::list_projects))
            .route("", web::post().to(project_handlers::create_project))
            .route("/{id}", web::get().to(project_handlers::get_project))
            .route("/{id}", web::put().to(project_handlers::update_project))
            .route("/{id}", web::delete().to(project_handlers::delete_project))
            .route("/{id}/members", web::get().to(project_handlers::list_members))
            .route("/{id}/members", web::post().to(project_handlers::add_member))
            .route(
                "/{id}/members/{user_id}",
                web::delete().to(project_handlers::remove_member),
            ),
    );
}

pub fn tasks_configure(cfg: &mut web::ServiceConfig) {
    // Literal segments are registered ahead of /{id} so they match first.
    cfg.service(
        web::scope("/api/tasks")
            .route("", web::get().to(task_handlers::list_tasks))
            .route("", web::post().to(task_handlers::create_task))
            .route("/overdue", web::get().to(task_handlers::overdue_tasks))
            .route("/search", web::get().to(task_handlers::search_tasks))
            .route("/{id}", web::get().to(task_handlers::get_task))
            .route("/{id}", web::put().to(task_handlers::update_task))
            .route("/{id}", web::delete().to(task_handlers::delete_task))
            .route(
                "/{id}/status/{status}",
                web::post().to(task_handlers::change_status),
            )
            .route("/{id}/history", web::get().to(task_handlers::task_history)),
    );
}

pub fn subtasks_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/subtasks")
            .route("", web::get().to(subtask_handlers::list_subtasks))
            .route("", web::post().to(subtask_handlers::create_subtask))
            .route("/{id}", web::get().to(subtask_handlers::get_subtask))
            .route("/{id}", web::put().to(subtask_handlers::update_subtask))
            .route("/{id}", web::delete().to(subtask_handlers::delete_subtask)),
    );
}

pub fn comments_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/comments")
            .route("", web::get().to(comment_handlers::list_comments))
            .route("", web::post().to(comment_handlers::create_comment))
            .route("/{id}", web::get().to(comment_handlers::get_comment))
            .route("/{id}", web::put().to(comment_handlers::update_comment))
            .route("/{id}", web::delete().to(comment_handlers::delete_comment)),
    );
}
