use actix_web::HttpResponse;
use actix_web::web::{self, Data};
use std::collections::HashMap;

use super::routes::{
    ServeConfig, error_response, flag_param, mode_param, required_param, stage_param,
};
use crate::error::ResultsError;
use crate::model::StationCode;
use crate::score::ResultsService;
use crate::view::results::{render_category, render_live_ranking};

pub async fn categories(service: Data<ResultsService>) -> HttpResponse {
    match service.categories().await {
        Ok(categories) => HttpResponse::Ok().json(categories),
        Err(e) => error_response(&e),
    }
}

/// Live ranking of a category at one station: `?category=..&station=..[&stage=..][&html=1]`.
pub async fn live_results(
    query: web::Query<HashMap<String, String>>,
    service: Data<ResultsService>,
    config: Data<ServeConfig>,
) -> HttpResponse {
    let stage = stage_param(&query, &config);
    let parsed = required_param(&query, "category").and_then(|category| {
        let station = match query.get("station").map(|s| s.trim()) {
            None | Some("") => 0,
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                ResultsError::invalid_input(format!("station '{raw}' is not a number"))
            })?,
        };
        Ok((category.to_string(), station))
    });
    let (category, station) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return error_response(&e),
    };

    match service.compute_live_station_ranking(&category, &stage, station).await {
        Ok(entries) => {
            if flag_param(&query, "html") {
                let station = StationCode::normalize(station);
                let markup = render_live_ranking(&category, station, &entries);
                HttpResponse::Ok().content_type("text/html").body(markup.into_string())
            } else {
                HttpResponse::Ok().json(entries)
            }
        }
        Err(e) => error_response(&e),
    }
}

/// One computed category: `?category=..[&mode=snapshot|complete][&stage=..][&html=1]`.
pub async fn class_results(
    query: web::Query<HashMap<String, String>>,
    service: Data<ResultsService>,
    config: Data<ServeConfig>,
) -> HttpResponse {
    let stage = stage_param(&query, &config);
    let parsed = required_param(&query, "category")
        .and_then(|category| Ok((category.to_string(), mode_param(&query)?)));
    let (category, mode) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return error_response(&e),
    };

    if flag_param(&query, "html") {
        match service.compute_category_results(&category, &stage, mode).await {
            Ok(result) => {
                let markup = render_category(&result, mode);
                HttpResponse::Ok().content_type("text/html").body(markup.into_string())
            }
            Err(e) => error_response(&e),
        }
    } else {
        match service.build_category_document(&category, &stage, mode).await {
            Ok(document) => HttpResponse::Ok().json(document),
            Err(e) => error_response(&e),
        }
    }
}

/// Whole results document as json: `?mode=snapshot|complete[&stage=..]`.
pub async fn export(
    query: web::Query<HashMap<String, String>>,
    service: Data<ResultsService>,
    config: Data<ServeConfig>,
) -> HttpResponse {
    let stage = stage_param(&query, &config);
    let mode = match mode_param(&query) {
        Ok(mode) => mode,
        Err(e) => return error_response(&e),
    };
    match service.build_document(&stage, mode).await {
        Ok(document) => HttpResponse::Ok().json(document),
        Err(e) => error_response(&e),
    }
}
