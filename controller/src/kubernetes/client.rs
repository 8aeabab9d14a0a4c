use crate::cli::Cli;
use crate::kubernetes::{ClientError, Cluster, ResourceClient};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Node, Pod, Service};
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;
use tracing::{event, Level};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Unable to read kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("Unable to load in-cluster configuration: {0}")]
    InCluster(#[from] kube::config::InClusterError),

    #[error("Unable to create the Kubernetes client: {0}")]
    Client(#[from] kube::Error),
}

/// [`ResourceClient`] backed by the Kubernetes API server.
pub struct KubeResourceClient<K> {
    api: Api<K>,
    kind: &'static str,
}

impl<K> KubeResourceClient<K> {
    pub fn new(api: Api<K>, kind: &'static str) -> Self {
        KubeResourceClient { api, kind }
    }

    fn describe(&self, name: &str) -> String {
        format!("{} {}", self.kind, name)
    }
}

fn map_error(error: kube::Error, resource: String) -> ClientError {
    match error {
        kube::Error::Api(response) if response.code == 404 => ClientError::NotFound(resource),
        kube::Error::Api(response) if response.code == 409 && response.reason == "AlreadyExists" => {
            ClientError::AlreadyExists(resource)
        }
        kube::Error::Api(response) if response.code == 409 => {
            ClientError::Conflict(resource, response.message)
        }
        other => ClientError::Api(other.to_string()),
    }
}

#[async_trait]
impl<K> ResourceClient<K> for KubeResourceClient<K>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug + Send + Sync + 'static,
{
    async fn get(&self, name: &str) -> Result<K, ClientError> {
        self.api
            .get(name)
            .await
            .map_err(|e| map_error(e, self.describe(name)))
    }

    async fn list(&self) -> Result<Vec<K>, ClientError> {
        self.api
            .list(&ListParams::default())
            .await
            .map(|list| list.items)
            .map_err(|e| map_error(e, format!("{} list", self.kind)))
    }

    async fn create(&self, resource: &K) -> Result<K, ClientError> {
        self.api
            .create(&PostParams::default(), resource)
            .await
            .map_err(|e| map_error(e, self.describe(&resource.name_any())))
    }

    async fn replace(&self, name: &str, resource: &K) -> Result<K, ClientError> {
        self.api
            .replace(name, &PostParams::default(), resource)
            .await
            .map_err(|e| map_error(e, self.describe(name)))
    }

    async fn delete(&self, name: &str) -> Result<(), ClientError> {
        self.api
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| map_error(e, self.describe(name)))
    }
}

async fn load_config(cli: &Cli) -> Result<Config, ConnectionError> {
    if !cli.remote {
        event!(Level::INFO, "Using in-cluster credentials");
        return Ok(Config::incluster()?);
    }

    let options = KubeConfigOptions::default();
    let config = match &cli.kubeconfig {
        Some(path) => {
            event!(Level::INFO, "Using kubeconfig {}", path.display());
            Config::from_custom_kubeconfig(Kubeconfig::read_from(path)?, &options).await?
        }
        None => {
            event!(Level::INFO, "Using default kubeconfig");
            Config::from_kubeconfig(&options).await?
        }
    };
    Ok(config)
}

/// Connect to the orchestrator and build the per-kind clients for `namespace`.
pub async fn connect(cli: &Cli) -> Result<Cluster, ConnectionError> {
    let config = load_config(cli).await?;
    let client = Client::try_from(config)?;
    let namespace = cli.namespace.as_str();

    event!(Level::DEBUG, "Kubernetes client ready for namespace {}", namespace);
    Ok(Cluster {
        deployments: Arc::new(KubeResourceClient::new(
            Api::<Deployment>::namespaced(client.clone(), namespace),
            "deployment",
        )),
        services: Arc::new(KubeResourceClient::new(
            Api::<Service>::namespaced(client.clone(), namespace),
            "service",
        )),
        pods: Arc::new(KubeResourceClient::new(
            Api::<Pod>::namespaced(client.clone(), namespace),
            "pod",
        )),
        nodes: Arc::new(KubeResourceClient::new(Api::<Node>::all(client), "node")),
    })
}
