use actix_web::web::Data;
use actix_web::{App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rusty_orienteering::args::{self, CleanArgs, RunMode};
use rusty_orienteering::controller::export::{self, ExportSettings};
use rusty_orienteering::controller::routes::{self, ServeConfig};
use rusty_orienteering::controller::simulate;
use rusty_orienteering::score::{OfficialCategories, ResultsService};
use rusty_orienteering::storage::{JsonRosterProvider, SqlitePunchStore};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = match args::args_checks() {
        Ok(args) => args,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };

    if args.mode == RunMode::Simulate {
        if let Some(simulate_args) = &args.simulate {
            simulate::simulate(simulate_args).await?;
        }
        return Ok(());
    }

    let service = Arc::new(build_service(&args).await?);
    let settings = ExportSettings {
        stage: args.stage.clone(),
        mode: args.export_mode,
        output_dir: args.output_dir.clone(),
        interval: Duration::from_secs(args.interval_secs),
    };

    match args.mode {
        RunMode::ExportOnce => {
            let path =
                export::export_once(&service, &settings.stage, settings.mode, &settings.output_dir)
                    .await?;
            info!(path = %path.display(), "Results exported");
        }
        RunMode::ExportLoop => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted, stopping export loop");
                }
                on_signal.cancel();
            });
            export::run_export_loop(service, settings, cancel).await;
        }
        RunMode::Serve => serve(service, &args).await?,
        RunMode::Simulate => {}
    }
    Ok(())
}

async fn build_service(args: &CleanArgs) -> Result<ResultsService, Box<dyn std::error::Error>> {
    let punches = if args.punch_db == ":memory:" {
        SqlitePunchStore::open_in_memory()?
    } else {
        SqlitePunchStore::open(&args.punch_db)?
    };
    let roster_path = args
        .roster
        .as_deref()
        .ok_or("--roster is required unless in simulate mode")?;
    let roster = JsonRosterProvider::open(roster_path, args.utc_offset).await?;
    let official = roster
        .official_categories()
        .await
        .map(OfficialCategories::new)
        .unwrap_or_default();
    info!(punch_db = %args.punch_db, roster = %roster_path.display(), "Stores opened");

    let service = ResultsService::new(Arc::new(punches), Arc::new(roster));
    Ok(service.with_official_categories(official))
}

async fn serve(service: Arc<ResultsService>, args: &CleanArgs) -> std::io::Result<()> {
    let service = Data::from(service);
    let config = Data::new(ServeConfig {
        stage: args.stage.clone(),
    });

    info!(bind = %args.bind, stage = %args.stage, "Serving results");
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(config.clone())
            .configure(routes::configure)
    })
    .bind(&args.bind)?
    .run()
    .await
}
