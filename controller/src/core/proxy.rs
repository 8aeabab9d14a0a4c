use crate::core::restart::RestartPolicy;
use crate::core::ProxyError;
use crate::kubernetes::descriptor::{build_deployment, build_service};
use crate::kubernetes::{tags, ClientError, Cluster};
use definition::{ServiceDescriptor, ServiceStatus};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, event, info, warn, Level};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClusterProperties {
    pub pods: usize,
    pub nodes: usize,
    pub services: usize,
}

/// Domain operations on Turbine applications, on top of the raw resource
/// clients.
pub struct WorkloadProxy {
    cluster: Cluster,
    restart_policy: RestartPolicy,
}

impl WorkloadProxy {
    pub fn new(cluster: Cluster, restart_policy: RestartPolicy) -> WorkloadProxy {
        WorkloadProxy {
            cluster,
            restart_policy,
        }
    }

    pub(crate) fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub(crate) fn restart_policy(&self) -> &RestartPolicy {
        &self.restart_policy
    }

    /// Any lookup failure counts as absence.
    pub async fn exists(&self, name: &str) -> bool {
        self.cluster.deployments.get(name).await.is_ok()
    }

    /// Create the deployment for `service`, and its load balancer when exposed.
    ///
    /// The existence probe only gives a clearer error early; a concurrent
    /// creation is still caught by the orchestrator rejecting the duplicate.
    /// When the load balancer cannot be created the deployment stays in place.
    pub async fn deploy(&self, service: &ServiceDescriptor) -> Result<(), ProxyError> {
        if self.exists(&service.name).await {
            return Err(ProxyError::AlreadyExists(service.name.clone()));
        }

        self.cluster
            .deployments
            .create(&build_deployment(service))
            .await
            .map_err(|e| match e {
                ClientError::AlreadyExists(_) => ProxyError::AlreadyExists(service.name.clone()),
                other => ProxyError::Upstream(other),
            })?;
        info!("Deployment {} created", service.name);

        if service.exposed {
            self.cluster
                .services
                .create(&build_service(service))
                .await
                .map_err(|e| {
                    warn!(
                        "Deployment {} is running but could not be exposed: {}",
                        service.name, e
                    );
                    ProxyError::Upstream(e)
                })?;
            info!("Service {} created", service.name);
        }
        Ok(())
    }

    /// All deployments carrying the Turbine tag, in enumeration order.
    pub(crate) async fn managed_deployments(&self) -> Result<Vec<Deployment>, ProxyError> {
        let deployments = self.cluster.deployments.list().await?;
        debug!("{} deployments in namespace", deployments.len());
        Ok(deployments.into_iter().filter(tags::is_managed).collect())
    }

    pub async fn list(&self) -> Result<Vec<ServiceStatus>, ProxyError> {
        let mut applications = Vec::new();
        for deployment in self.managed_deployments().await? {
            let descriptor = describe(&deployment);
            let ip = if descriptor.exposed {
                self.external_address(&descriptor.name).await
            } else {
                String::new()
            };
            applications.push(ServiceStatus { descriptor, ip });
        }
        Ok(applications)
    }

    /// Best effort: a missing service or a pending load balancer gives "".
    async fn external_address(&self, name: &str) -> String {
        match self.cluster.services.get(name).await {
            Ok(service) => ingress_address(&service),
            Err(e) => {
                debug!("No external address for {}: {}", name, e);
                String::new()
            }
        }
    }

    /// Delete a managed deployment, then its load balancer when it was exposed.
    pub async fn delete(&self, name: &str) -> Result<(), ProxyError> {
        let deployment = self
            .cluster
            .deployments
            .get(name)
            .await
            .map_err(|e| match e {
                ClientError::NotFound(_) => ProxyError::NotFound(name.to_string()),
                other => ProxyError::Upstream(other),
            })?;
        if !tags::is_managed(&deployment) {
            return Err(ProxyError::NotManaged(name.to_string()));
        }

        let exposed = tags::extract_exposed(&deployment);
        self.cluster.deployments.delete(name).await?;
        info!("Deployment {} deleted", name);

        if exposed {
            self.cluster.services.delete(name).await?;
            info!("Service {} deleted", name);
        }
        Ok(())
    }

    pub async fn restart(&self, name: &str) -> Result<(), ProxyError> {
        crate::core::restart::restart(self, name).await
    }

    pub async fn cluster_properties(&self) -> Result<ClusterProperties, ProxyError> {
        let properties = ClusterProperties {
            pods: self.cluster.pods.list().await?.len(),
            nodes: self.cluster.nodes.list().await?.len(),
            services: self.cluster.services.list().await?.len(),
        };
        event!(
            Level::INFO,
            "There are {} pods, {} nodes and {} services in the cluster",
            properties.pods,
            properties.nodes,
            properties.services
        );
        Ok(properties)
    }
}

/// Re-derive the descriptor a managed deployment was created from.
fn describe(deployment: &Deployment) -> ServiceDescriptor {
    let spec = deployment.spec.as_ref();
    let image = spec
        .and_then(|spec| spec.template.spec.as_ref())
        .and_then(|pod| pod.containers.first())
        .and_then(|container| container.image.clone())
        .unwrap_or_default();

    ServiceDescriptor {
        name: deployment.name_any(),
        image,
        port: tags::extract_port(deployment),
        replicas: spec.and_then(|spec| spec.replicas).unwrap_or(1),
        exposed: tags::extract_exposed(deployment),
    }
}

fn ingress_address(service: &Service) -> String {
    service
        .status
        .as_ref()
        .and_then(|status| status.load_balancer.as_ref())
        .and_then(|balancer| balancer.ingress.as_ref())
        .and_then(|ingress| ingress.first())
        .and_then(|entry| entry.ip.clone().or_else(|| entry.hostname.clone()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{assign_ingress, descriptor, fake, unmanaged_deployment, FakeCluster};
    use crate::tests::memory::Fault;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_deploy_unexposed(fake: FakeCluster, descriptor: ServiceDescriptor) {
        let proxy = fake.proxy();
        proxy.deploy(&descriptor).await.unwrap();

        assert_eq!(fake.deployments.names(), vec!["svc1"]);
        assert!(fake.services.names().is_empty());
        assert!(proxy.exists("svc1").await);

        let listed = proxy.list().await.unwrap();
        assert_eq!(
            listed,
            vec![ServiceStatus {
                descriptor,
                ip: String::new()
            }]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_deploy_and_delete_exposed(fake: FakeCluster, mut descriptor: ServiceDescriptor) {
        descriptor.exposed = true;
        let proxy = fake.proxy();
        proxy.deploy(&descriptor).await.unwrap();

        assert_eq!(fake.deployments.names(), vec!["svc1"]);
        assert_eq!(fake.services.names(), vec!["svc1"]);

        proxy.delete("svc1").await.unwrap();
        assert!(fake.deployments.names().is_empty());
        assert!(fake.services.names().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_deploy_twice(fake: FakeCluster, descriptor: ServiceDescriptor) {
        let proxy = fake.proxy();
        proxy.deploy(&descriptor).await.unwrap();
        let before = fake.deployments.get_stored("svc1");

        let mut again = descriptor.clone();
        again.image = "nginx:2.0".to_string();
        again.exposed = true;
        assert_eq!(
            proxy.deploy(&again).await,
            Err(ProxyError::AlreadyExists("svc1".to_string()))
        );
        assert_eq!(fake.deployments.get_stored("svc1"), before);
        assert!(fake.services.names().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_duplicate_rejected_by_orchestrator(
        fake: FakeCluster,
        descriptor: ServiceDescriptor,
    ) {
        // Created concurrently, after the existence probe ran.
        fake.deployments.fail_next_get(Fault::NotFound);
        fake.deployments.insert(build_deployment(&descriptor));

        assert_eq!(
            fake.proxy().deploy(&descriptor).await,
            Err(ProxyError::AlreadyExists("svc1".to_string()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_exposure_failure_keeps_deployment(
        fake: FakeCluster,
        mut descriptor: ServiceDescriptor,
    ) {
        descriptor.exposed = true;
        fake.services.fail_next_create(Fault::Api);

        let result = fake.proxy().deploy(&descriptor).await;
        assert!(matches!(result, Err(ProxyError::Upstream(ClientError::Api(_)))));
        assert_eq!(fake.deployments.names(), vec!["svc1"]);
        assert!(fake.services.names().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_skips_unmanaged_and_reads_ip(
        fake: FakeCluster,
        mut descriptor: ServiceDescriptor,
    ) {
        descriptor.exposed = true;
        let proxy = fake.proxy();
        proxy.deploy(&descriptor).await.unwrap();
        fake.deployments.insert(unmanaged_deployment("postgres", "postgres:15"));
        assign_ingress(&fake.services, "svc1", "34.1.2.3");

        let listed = proxy.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].descriptor, descriptor);
        assert_eq!(listed[0].ip, "34.1.2.3");
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_degrades_without_service(
        fake: FakeCluster,
        mut descriptor: ServiceDescriptor,
    ) {
        descriptor.exposed = true;
        fake.deployments.insert(build_deployment(&descriptor));

        let listed = fake.proxy().list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].descriptor.exposed);
        assert_eq!(listed[0].ip, "");
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_error(fake: FakeCluster) {
        fake.deployments.fail_next_list(Fault::Api);
        assert!(matches!(
            fake.proxy().list().await,
            Err(ProxyError::Upstream(ClientError::Api(_)))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_unmanaged(fake: FakeCluster) {
        fake.deployments.insert(unmanaged_deployment("postgres", "postgres:15"));

        assert_eq!(
            fake.proxy().delete("postgres").await,
            Err(ProxyError::NotManaged("postgres".to_string()))
        );
        assert_eq!(fake.deployments.names(), vec!["postgres"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_missing(fake: FakeCluster) {
        assert_eq!(
            fake.proxy().delete("ghost").await,
            Err(ProxyError::NotFound("ghost".to_string()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_service_failure_after_deployment(
        fake: FakeCluster,
        mut descriptor: ServiceDescriptor,
    ) {
        descriptor.exposed = true;
        let proxy = fake.proxy();
        proxy.deploy(&descriptor).await.unwrap();
        fake.services.fail_next_delete(Fault::Api);

        assert!(proxy.delete("svc1").await.is_err());
        assert!(fake.deployments.names().is_empty());
        assert_eq!(fake.services.names(), vec!["svc1"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_cluster_properties(fake: FakeCluster, mut descriptor: ServiceDescriptor) {
        descriptor.exposed = true;
        let proxy = fake.proxy();
        proxy.deploy(&descriptor).await.unwrap();
        fake.add_pods(&["svc1-a", "svc1-b"]);
        fake.add_nodes(&["node-1"]);

        assert_eq!(
            proxy.cluster_properties().await.unwrap(),
            ClusterProperties {
                pods: 2,
                nodes: 1,
                services: 1
            }
        );
    }

    #[test]
    fn test_describe_tolerates_partial_deployment() {
        let mut deployment = Deployment::default();
        deployment.metadata.name = Some("bare".to_string());
        let descriptor = describe(&deployment);
        assert_eq!(descriptor.name, "bare");
        assert_eq!(descriptor.image, "");
        assert_eq!(descriptor.port, 0);
        assert_eq!(descriptor.replicas, 1);
        assert!(!descriptor.exposed);
    }
}
