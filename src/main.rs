use actix_web::{App, HttpServer, web};
use actix_web::middleware::Logger;
use log::info;
use log4rs;

use iron_log::api::{
    latest_for_muscle_handler,
    latest_for_workout_handler,
    latest_log_handler,
    list_index_handler,
    log_by_date_handler,
    save_log_handler,
};
use iron_log::app_state::AppState;
use iron_log::config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::load()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    log4rs::init_file(&config.logging.config_file, Default::default())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    info!("Starting server on {}:{}", config.server.host, config.server.port);

    let state = AppState::from_config(config.clone());
    let max_payload_size = config.server.max_payload_size as usize;

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::PayloadConfig::default().limit(max_payload_size))
            .app_data(web::Data::new(state.clone()))
            .route("/logs", web::post().to(save_log_handler))
            .route("/logs/index", web::get().to(list_index_handler))
            .route("/logs/latest", web::get().to(latest_log_handler))
            .route("/logs/latest_for_workout", web::get().to(latest_for_workout_handler))
            .route("/logs/latest_for_muscle", web::get().to(latest_for_muscle_handler))
            .route("/logs/by-date/{date}", web::get().to(log_by_date_handler))
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
