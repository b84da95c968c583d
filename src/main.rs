// src/main.rs

use std::sync::Arc;

use actix::Actor;
use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use print_shop_board::app_state::AppState;
use print_shop_board::board_api;
use print_shop_board::board_server::{forward_store_events, BoardServer};
use print_shop_board::board_service::BoardService;
use print_shop_board::config::Config;
use print_shop_board::persistence::{InMemoryTaskRepository, TaskRepository};
use print_shop_board::task_db::MongoTaskRepository;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let repo: Arc<dyn TaskRepository> = match &config.mongo_uri {
        Some(uri) => {
            let mongo = MongoTaskRepository::init(uri, &config.database_name, &config.tasks_collection)
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            Arc::new(mongo)
        }
        None => {
            info!("MONGO_URI not set, tasks are kept in memory only");
            Arc::new(InMemoryTaskRepository::new())
        }
    };

    let board = BoardService::load(repo)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let board = Arc::new(board);

    let board_server = BoardServer::new().start();
    forward_store_events(&mut *board.lock().await, board_server.clone());

    let bind_addr = config.bind_addr;
    info!("Server running at http://{}", bind_addr);
    info!("Allowed CORS Origin: {}", config.frontend_origin);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config.frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![http::header::CONTENT_TYPE, http::header::ACCEPT])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(AppState {
                board: board.clone(),
                board_server: board_server.clone(),
                config: config.clone(),
            }))
            .configure(board_api::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
