#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use healthcheck::{EndpointRegistry, FileRegistry, HealthEngine, StaticRegistry, StatusHistoryEnricher};
use tracing::{debug, info, warn};

mod config;
mod error;
mod routes;

use config::Config;
use error::AppError;

/// Config path baked in from `.env` at build time, if any
const BUILD_CONFIG_PATH: Option<&str> = option_env!("STATUS_SERVER_CONFIG");

#[derive(Debug, Parser)]
#[command(version, about = "Uppe status server: probes endpoints and reports system health")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the port
    #[arg(short, long)]
    port: Option<u16>,

    /// Run a single cycle, print the report as JSON and exit
    #[arg(long)]
    once: bool,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(|| BUILD_CONFIG_PATH.map(PathBuf::from));
    let mut config = Config::from_config(config_path)?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if let Err(error) = logger::init_with(config.logging.level_filter()?, config.logging.log_format()?) {
        warn!("Tracing already initialized: {error}");
    }
    debug!("{config}");

    let engine = web::Data::new(build_engine(&config)?);

    if args.once {
        let report = engine.run_cycle().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    run_server(addr, engine).await
}

/// Wire registry, settings and enricher from the config into an engine
fn build_engine(config: &Config) -> Result<HealthEngine, AppError> {
    let registry: Arc<dyn EndpointRegistry> = match &config.endpoints_file {
        Some(path) => Arc::new(FileRegistry::new(path.clone())),
        None => Arc::new(StaticRegistry::new(config.endpoints.clone())?),
    };

    let engine = HealthEngine::new(registry, config.checks.to_settings())?;

    Ok(if config.checks.history {
        engine.with_enricher(Arc::new(StatusHistoryEnricher::new()))
    } else {
        engine
    })
}

async fn run_server(addr: SocketAddr, engine: web::Data<HealthEngine>) -> Result<(), AppError> {
    info!("Status server listening on {addr}");

    HttpServer::new(move || App::new().app_data(engine.clone()).configure(routes::routes))
        .bind(addr)?
        .run()
        .await?;

    Ok(())
}
