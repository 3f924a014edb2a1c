//! HTTP handlers for the logs API

pub mod auth;

use actix_web::{web, HttpRequest, HttpResponse, Error};
use actix_web::error::ErrorBadRequest;
use log::debug;
use serde::Deserialize;

use crate::api::auth::authenticate_request;
use crate::app_state::AppState;
use crate::model::{is_iso_date, WorkoutLog, WorkoutType};

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub before: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WorkoutQuery {
    #[serde(rename = "type")]
    pub workout_type: String,
    pub before: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MuscleQuery {
    pub muscle: String,
    pub before: Option<String>,
}

/// POST /logs
/// Upserts the per-date document and its manifest entry
pub async fn save_log_handler(
    log: web::Json<WorkoutLog>,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    authenticate_request(&req, &app_state.config.auth.api_key)?;
    debug!("Saving log for date {}", log.date);

    let receipt = app_state.log_service.save_log(log.into_inner()).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

/// GET /logs/index
pub async fn list_index_handler(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    authenticate_request(&req, &app_state.config.auth.api_key)?;

    let entries = app_state.log_service.manifest_entries().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "entries": entries })))
}

/// GET /logs/latest?before=YYYY-MM-DD
pub async fn latest_log_handler(
    query: web::Query<LatestQuery>,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    authenticate_request(&req, &app_state.config.auth.api_key)?;

    let found = app_state
        .log_service
        .latest(query.before.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(found))
}

/// GET /logs/latest_for_workout?type=push|pull|legs&before=YYYY-MM-DD
pub async fn latest_for_workout_handler(
    query: web::Query<WorkoutQuery>,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    authenticate_request(&req, &app_state.config.auth.api_key)?;

    let workout_type: WorkoutType = query
        .workout_type
        .parse()
        .map_err(ErrorBadRequest)?;
    debug!("Looking up latest {} workout", workout_type);

    let found = app_state
        .log_service
        .latest_for_workout(workout_type, query.before.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(found))
}

/// GET /logs/latest_for_muscle?muscle=chest&before=YYYY-MM-DD
pub async fn latest_for_muscle_handler(
    query: web::Query<MuscleQuery>,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    authenticate_request(&req, &app_state.config.auth.api_key)?;
    debug!("Looking up latest log for muscle '{}'", query.muscle);

    let found = app_state
        .log_service
        .latest_for_muscle(&query.muscle, query.before.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(found))
}

/// GET /logs/by-date/{date}
/// Returns the raw stored document for the date
pub async fn log_by_date_handler(
    path: web::Path<String>,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    authenticate_request(&req, &app_state.config.auth.api_key)?;

    let date = path.into_inner();
    if !is_iso_date(&date) {
        return Err(ErrorBadRequest("date must be YYYY-MM-DD"));
    }

    let log = app_state.log_service.log_by_date(&date).await?;
    Ok(HttpResponse::Ok().json(log))
}
