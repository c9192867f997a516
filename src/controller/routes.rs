use actix_web::{HttpResponse, web};
use serde_json::json;
use std::collections::HashMap;

use super::{live, punch, results};
use crate::error::ResultsError;
use crate::model::ResultsMode;

/// Settings the handlers fall back on when a request leaves them out.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub stage: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/punch", web::post().to(punch::punch))
        .route("/categories", web::get().to(results::categories))
        .route("/results", web::get().to(results::live_results))
        .route("/class", web::get().to(results::class_results))
        .route("/export", web::get().to(results::export))
        .route("/live", web::get().to(live::live))
        .route("/health", web::get().to(health));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

#[must_use]
pub fn error_response(err: &ResultsError) -> HttpResponse {
    let body = json!({"error": err.to_string()});
    match err {
        ResultsError::NotFound { .. } => HttpResponse::NotFound().json(body),
        ResultsError::UpstreamUnavailable { .. } => HttpResponse::ServiceUnavailable().json(body),
        ResultsError::InvalidInput { .. } => HttpResponse::BadRequest().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

pub(crate) fn stage_param<S: std::hash::BuildHasher>(
    query: &HashMap<String, String, S>,
    config: &ServeConfig,
) -> String {
    query
        .get("stage")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(config.stage.as_str())
        .to_string()
}

pub(crate) fn required_param<'a, S: std::hash::BuildHasher>(
    query: &'a HashMap<String, String, S>,
    key: &str,
) -> Result<&'a str, ResultsError> {
    query
        .get(key)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ResultsError::invalid_input(format!("{key} parameter is required")))
}

pub(crate) fn mode_param<S: std::hash::BuildHasher>(
    query: &HashMap<String, String, S>,
) -> Result<ResultsMode, ResultsError> {
    match query.get("mode").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(mode) => mode.parse().map_err(ResultsError::invalid_input),
        None => Ok(ResultsMode::Snapshot),
    }
}

pub(crate) fn flag_param<S: std::hash::BuildHasher>(
    query: &HashMap<String, String, S>,
    key: &str,
) -> bool {
    match query.get(key).map(String::as_str) {
        Some("1") => true,
        Some("0") | None => false,
        Some(other) => other.parse().unwrap_or(false),
    }
}
