use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use super::punch::PunchRequest;
use crate::args::SimulateArgs;

/// Intermediate controls are numbered from here, the way course setters usually do.
const FIRST_CONTROL: i64 = 31;

/// `count` punches a second apart: intermediate controls first, the configured station last.
#[must_use]
pub fn simulated_punches(args: &SimulateArgs, now: i64) -> Vec<PunchRequest> {
    let count = i64::from(args.count.max(1));
    (0..count)
        .map(|i| {
            let station_code = if i == count - 1 {
                args.station
            } else {
                FIRST_CONTROL + i
            };
            PunchRequest {
                chip_number: args.chip,
                station_code,
                time: now - (count - 1 - i),
                stage: None,
            }
        })
        .collect()
}

/// Posts the simulated punches to a running server.
///
/// # Errors
///
/// Will return `Err` if the server cannot be reached
pub async fn simulate(args: &SimulateArgs) -> Result<(), reqwest::Error> {
    let client = Client::new();
    let url = format!("{}/punch", args.target);
    let punches = simulated_punches(args, chrono::Utc::now().timestamp());
    let last = punches.len().saturating_sub(1);

    for (i, punch) in punches.into_iter().enumerate() {
        let resp = client.post(&url).json(&punch).send().await?;
        let status = resp.status();
        if status.is_success() {
            info!(chip = punch.chip_number, station = punch.station_code, %status, "Punch sent");
        } else {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                chip = punch.chip_number,
                station = punch.station_code,
                %status,
                %body,
                "Punch rejected"
            );
        }
        if i < last {
            tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
        }
    }
    Ok(())
}
