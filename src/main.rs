use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use dotenv::dotenv;
use log::info;

use taskhub_backend::cache::Cache;
use taskhub_backend::config::Config;
use taskhub_backend::jobs::scheduler;
use taskhub_backend::middleware::page_visit::{PageVisitTracker, VisitQueue};
use taskhub_backend::routes::routes;
use taskhub_backend::db;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to create pool");
    db::init_schema(&pool)
        .await
        .expect("Failed to initialize schema");

    let cache = web::Data::new(Cache::new());
    let visit_queue = Arc::new(VisitQueue::new());

    scheduler::spawn_all(pool.clone(), visit_queue.clone(), config.jobs.clone());

    info!("Server running at http://{}", config.bind_addr);

    let bind_addr = config.bind_addr.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(PageVisitTracker::new(visit_queue.clone()))
            .app_data(web::Data::new(pool.clone()))
            .app_data(cache.clone())
            .route(
                "/",
                web::get().to(|| async { HttpResponse::Ok().body("Hello, this is the Taskhub API.") }),
            )
            .configure(routes::users_configure)
            .configure(routes::user_bios_configure)
            .configure(routes::projects_configure)
            .configure(routes::tasks_configure)
            .configure(routes::subtasks_configure)
            .configure(routes::comments_configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
