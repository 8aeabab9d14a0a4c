use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const MAX_NAME_LENGTH: usize = 63;

/// A Turbine application as submitted by a client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Unique name, also used for the workload, its endpoint and its pod labels
    pub name: String,
    pub image: String,
    pub port: i32,
    pub replicas: i32,
    /// Whether a load-balanced endpoint is created in front of the workload
    #[serde(default, alias = "expose")]
    pub exposed: bool,
}

/// A descriptor re-derived from a live workload, with the external address
/// of its endpoint when it has one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    #[serde(flatten)]
    pub descriptor: ServiceDescriptor,
    #[serde(default)]
    pub ip: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name {0} is longer than 63 characters")]
    NameTooLong(String),

    #[error("name {0} must consist of lowercase alphanumerics or '-', and start and end with an alphanumeric")]
    InvalidName(String),

    #[error("image must not be empty or contain whitespace")]
    InvalidImage,

    #[error("port {0} is outside of 1..=65535")]
    InvalidPort(i32),

    #[error("replicas must be positive or zero, got {0}")]
    InvalidReplicas(i32),
}

impl ServiceDescriptor {
    /// Checks that the descriptor can be turned into cluster resources.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        validate_name(&self.name)?;

        if self.image.is_empty() || self.image.chars().any(char::is_whitespace) {
            return Err(DescriptorError::InvalidImage);
        }
        if !(1..=65535).contains(&self.port) {
            return Err(DescriptorError::InvalidPort(self.port));
        }
        if self.replicas < 0 {
            return Err(DescriptorError::InvalidReplicas(self.replicas));
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), DescriptorError> {
    if name.is_empty() {
        return Err(DescriptorError::EmptyName);
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(DescriptorError::NameTooLong(name.to_string()));
    }

    let allowed = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let alphanumeric_edges = !name.starts_with('-') && !name.ends_with('-');
    if !allowed || !alphanumeric_edges {
        return Err(DescriptorError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Name: {}, Image: {}, Port: {}, Replicas: {}, Exposed: {}",
            self.name, self.image, self.port, self.replicas, self.exposed
        )
    }
}
