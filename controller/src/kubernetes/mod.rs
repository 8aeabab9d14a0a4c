use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Node, Pod, Service};
use std::sync::Arc;
use thiserror::Error;

pub mod client;
pub mod descriptor;
pub mod tags;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Conflicting update on {0}: {1}")]
    Conflict(String, String),

    #[error("Orchestrator API error: {0}")]
    Api(String),
}

impl ClientError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::Conflict(..))
    }
}

/// CRUD access to one kind of orchestrator resource.
///
/// `replace` submits the whole object, including the resource version read
/// with `get`: the orchestrator answers `Conflict` when the object changed in
/// between.
#[async_trait]
pub trait ResourceClient<K: Send + Sync + 'static>: Send + Sync {
    async fn get(&self, name: &str) -> Result<K, ClientError>;
    async fn list(&self) -> Result<Vec<K>, ClientError>;
    async fn create(&self, resource: &K) -> Result<K, ClientError>;
    async fn replace(&self, name: &str, resource: &K) -> Result<K, ClientError>;
    async fn delete(&self, name: &str) -> Result<(), ClientError>;
}

/// Handles on every resource kind the controller touches, scoped to the
/// target namespace (nodes are cluster-wide).
#[derive(Clone)]
pub struct Cluster {
    pub deployments: Arc<dyn ResourceClient<Deployment>>,
    pub services: Arc<dyn ResourceClient<Service>>,
    pub pods: Arc<dyn ResourceClient<Pod>>,
    pub nodes: Arc<dyn ResourceClient<Node>>,
}
