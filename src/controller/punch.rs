use actix_web::HttpResponse;
use actix_web::web::{self, Data};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::routes::{ServeConfig, error_response};
use crate::model::Punch;
use crate::score::ResultsService;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PunchRequest {
    pub chip_number: i64,
    pub station_code: i64,
    /// Unix seconds.
    pub time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

pub async fn punch(
    body: web::Json<PunchRequest>,
    service: Data<ResultsService>,
    config: Data<ServeConfig>,
) -> HttpResponse {
    let request = body.into_inner();
    let stage = request
        .stage
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| config.stage.clone());
    let punch = Punch::new(request.chip_number, request.station_code, request.time, stage);

    match service.ingest_punch(punch).await {
        Ok(Some(document)) => HttpResponse::Ok().json(document.as_ref()),
        Ok(None) => HttpResponse::Accepted().json(json!({"recorded": true})),
        Err(e) => error_response(&e),
    }
}
