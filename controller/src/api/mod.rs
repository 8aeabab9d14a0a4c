pub mod external;

use crate::core::ProxyError;
use definition::DescriptorError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed request body: {0}")]
    Parsing(#[from] serde_json::Error),

    #[error("Invalid service descriptor: {0}")]
    InvalidDescriptor(#[from] DescriptorError),

    #[error(transparent)]
    Workload(#[from] ProxyError),

    #[error("The orchestrator did not answer within {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Workload(ProxyError::AlreadyExists(_)) => 409,
            ApiError::Workload(ProxyError::NotFound(_)) => 404,
            ApiError::Timeout(_) => 504,
            _ => 400,
        }
    }
}
