use actix_web::HttpResponse;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::web::{Bytes, Data};
use futures::stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::score::ResultsService;

/// Server-sent event name carrying a single-person document.
pub const PUNCH_EVENT: &str = "new_punch";

fn sse_frame(event: &str, data: &str) -> Bytes {
    Bytes::from(format!("event: {event}\ndata: {data}\n\n"))
}

/// `GET /live`: streams the document of every ingested punch as it is published.
pub async fn live(service: Data<ResultsService>) -> HttpResponse {
    let receiver = service.subscribe();
    debug!("Live subscriber connected");

    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(document) => match serde_json::to_string(document.as_ref()) {
                    Ok(json) => {
                        let frame = sse_frame(PUNCH_EVENT, &json);
                        return Some((Ok::<_, actix_web::Error>(frame), receiver));
                    }
                    Err(e) => warn!(error = %e, "Cannot encode live document, skipping"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live subscriber fell behind, documents dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(events)
}
