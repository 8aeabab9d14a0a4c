use crate::kubernetes::ClientError;
use thiserror::Error;

pub mod proxy;
pub mod reactor;
pub mod restart;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProxyError {
    #[error("Application {0} already exist")]
    AlreadyExists(String),

    #[error("Application {0} not found")]
    NotFound(String),

    #[error("Application {0} is not a Turbine-application")]
    NotManaged(String),

    #[error("Application {name} could not be restarted after {attempts} conflicting updates")]
    ConflictExceeded { name: String, attempts: u32 },

    #[error(transparent)]
    Upstream(#[from] ClientError),
}
