use std::io::Error as IoError;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use healthcheck::{CycleError, RegistryError, SettingsError};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid endpoint list: {0}")]
    Registry(#[from] RegistryError),
    #[error("Invalid check settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("Health check cycle failed: {0}")]
    Cycle(#[from] CycleError),
    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

/// A cycle that could not produce a report, as seen by HTTP clients
#[derive(Debug, Error)]
#[error(transparent)]
pub struct CycleFailure(#[from] CycleError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for CycleFailure {
    fn status_code(&self) -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody { error: self.to_string() })
    }
}
