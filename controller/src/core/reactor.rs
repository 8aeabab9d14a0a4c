use crate::core::proxy::WorkloadProxy;
use crate::core::ProxyError;
use crate::kubernetes::tags;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{event, Level};

/// Restarts the managed applications running an image that was just pushed.
#[derive(Clone)]
pub struct RegistryReactor {
    proxy: Arc<WorkloadProxy>,
}

impl RegistryReactor {
    pub fn new(proxy: Arc<WorkloadProxy>) -> RegistryReactor {
        RegistryReactor { proxy }
    }

    /// Restart, one after the other, every managed deployment with a
    /// container running `repository:tag`, and return their names.
    ///
    /// The first failing restart stops the batch: deployments after it are
    /// left untouched and the error is returned alone.
    pub async fn on_push(&self, repository: &str, tag: &str) -> Result<Vec<String>, ProxyError> {
        event!(Level::INFO, "Image {}:{} has been pushed", repository, tag);
        let matching: Vec<String> = self
            .proxy
            .managed_deployments()
            .await?
            .iter()
            .filter(|deployment| tags::image_matches(deployment, repository, tag))
            .map(|deployment| deployment.name_any())
            .collect();

        for name in &matching {
            self.proxy.restart(name).await?;
        }
        event!(
            Level::INFO,
            "{} application(s) restarted for {}:{}",
            matching.len(),
            repository,
            tag
        );
        Ok(matching)
    }
}
