use crate::kubernetes::tags;
use definition::ServiceDescriptor;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapEnvSource, Container, ContainerPort, EnvFromSource, EnvVar, EnvVarSource,
    ObjectFieldSelector, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

pub const APP_LABEL: &str = "app";
pub const SIDECAR_NAME: &str = "turbine-sidecar";
pub const SIDECAR_IMAGE: &str = "hazelcast/turbine-sidecar";
pub const SIDECAR_CONFIG: &str = "turbine-sidecar-config";
pub const POD_IP_VARIABLE: &str = "TURBINE_POD_IP";

fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), name.to_string())])
}

fn template_annotations(service: &ServiceDescriptor) -> BTreeMap<String, String> {
    BTreeMap::from([
        (tags::CONFIGMAP.to_string(), SIDECAR_CONFIG.to_string()),
        (tags::ENABLED.to_string(), "true".to_string()),
        (tags::EXPOSED.to_string(), service.exposed.to_string()),
        (tags::PORT.to_string(), service.port.to_string()),
    ])
}

fn application_container(service: &ServiceDescriptor) -> Container {
    Container {
        name: service.name.clone(),
        image: Some(service.image.clone()),
        ports: Some(vec![ContainerPort {
            container_port: service.port,
            ..Default::default()
        }]),
        image_pull_policy: Some("Always".to_string()),
        ..Default::default()
    }
}

/// The sidecar learns its pod address from the downward API and the rest of
/// its configuration from a shared config map.
fn sidecar_container() -> Container {
    Container {
        name: SIDECAR_NAME.to_string(),
        image: Some(SIDECAR_IMAGE.to_string()),
        env: Some(vec![EnvVar {
            name: POD_IP_VARIABLE.to_string(),
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    field_path: "status.podIP".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        env_from: Some(vec![EnvFromSource {
            config_map_ref: Some(ConfigMapEnvSource {
                name: Some(SIDECAR_CONFIG.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        ..Default::default()
    }
}

/// Build the deployment running `service` next to the Turbine sidecar.
pub fn build_deployment(service: &ServiceDescriptor) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(service.name.clone()),
            labels: Some(app_labels(&service.name)),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(service.replicas),
            selector: LabelSelector {
                match_labels: Some(app_labels(&service.name)),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(app_labels(&service.name)),
                    annotations: Some(template_annotations(service)),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![application_container(service), sidecar_container()],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Build the load balancer exposing `service` outside of the cluster.
pub fn build_service(service: &ServiceDescriptor) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(service.name.clone()),
            labels: Some(app_labels(&service.name)),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                port: service.port,
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            selector: Some(app_labels(&service.name)),
            type_: Some("LoadBalancer".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
