use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Result, ResultsError};
use crate::model::ResultsMode;
use crate::score::ResultsService;

#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub stage: String,
    pub mode: ResultsMode,
    pub output_dir: PathBuf,
    pub interval: Duration,
}

#[must_use]
pub fn export_file_name(stage: &str, mode: ResultsMode) -> String {
    format!("results_{stage}_{}.json", mode.as_str())
}

/// Writes the stage's results document into `output_dir`. Readers never see a partial file.
///
/// # Errors
///
/// Will return `Err` if the document cannot be built or written
pub async fn export_once(
    service: &ResultsService,
    stage: &str,
    mode: ResultsMode,
    output_dir: &Path,
) -> Result<PathBuf> {
    let document = service.build_document(stage, mode).await?;
    let bytes = serde_json::to_vec_pretty(&document)?;

    let target = output_dir.join(export_file_name(stage, mode));
    let staging = target.with_extension("json.tmp");
    tokio::fs::write(&staging, &bytes)
        .await
        .map_err(|source| ResultsError::Export {
            path: staging.clone(),
            source,
        })?;
    tokio::fs::rename(&staging, &target)
        .await
        .map_err(|source| ResultsError::Export {
            path: target.clone(),
            source,
        })?;

    debug!(path = %target.display(), bytes = bytes.len(), "Exported results document");
    Ok(target)
}

/// Exports on every tick until `cancel` fires. A failed cycle is logged and the next tick tries
/// again.
pub async fn run_export_loop(
    service: Arc<ResultsService>,
    settings: ExportSettings,
    cancel: CancellationToken,
) {
    info!(
        stage = %settings.stage,
        mode = settings.mode.as_str(),
        interval_secs = settings.interval.as_secs(),
        "Export loop started"
    );
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if let Err(e) = service.refresh_roster().await {
            warn!(error = %e, "Roster refresh failed, exporting from the previous roster");
        }

        match export_once(&service, &settings.stage, settings.mode, &settings.output_dir).await {
            Ok(path) => info!(path = %path.display(), "Results exported"),
            Err(e) if e.is_retryable() => warn!(error = %e, "Export failed, retrying next tick"),
            Err(e) => error!(error = %e, "Export failed"),
        }
    }
    info!("Export loop stopped");
}
