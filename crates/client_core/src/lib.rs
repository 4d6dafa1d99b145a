//! Client orchestration for the cipherviz crypto service: session gate, file
//! selection, simulated progress, the stage visualization and the controller
//! that sequences them around each service call.

pub mod clock;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod file_selection;
pub mod notify;
pub mod operation;
pub mod progress;
pub mod service;
pub mod session;
pub mod visualization;

use std::sync::Arc;

pub use command::{dispatch, Command, CommandOutcome, StatusReport};
pub use config::{load_config, ClientConfig, Timings};
pub use controller::{DownloadedFile, OperationController, TextView};
pub use error::OperationError;
pub use service::{CryptoService, HttpCryptoService, ServiceError};

/// Controller talking HTTP to `config.server_url`.
pub fn connect(config: ClientConfig) -> Result<OperationController, url::ParseError> {
    let service = HttpCryptoService::new(&config.server_url)?;
    tracing::info!(server_url = %service.base_url(), "crypto service client ready");
    Ok(OperationController::new(Arc::new(service), config))
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
