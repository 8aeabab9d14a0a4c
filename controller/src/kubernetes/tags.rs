//! Turbine metadata stored as annotations on a deployment's pod template.
//!
//! Values are always strings. Reads are tolerant: a missing or unparsable
//! value yields the type's zero value instead of an error, so a hand-edited
//! annotation never breaks the enumeration of workloads.

use k8s_openapi::api::apps::v1::Deployment;
use std::collections::BTreeMap;

pub const ENABLED: &str = "turbine/enabled";
pub const PORT: &str = "turbine/port";
pub const EXPOSED: &str = "turbine/exposed";
pub const RESTARTED_AT: &str = "turbine/restartedAt";
pub const CONFIGMAP: &str = "turbine/configmap";

const DEFAULT_TAG: &str = "latest";

fn annotations(deployment: &Deployment) -> Option<&BTreeMap<String, String>> {
    deployment
        .spec
        .as_ref()?
        .template
        .metadata
        .as_ref()?
        .annotations
        .as_ref()
}

pub fn read_tag<'a>(deployment: &'a Deployment, key: &str) -> Option<&'a str> {
    annotations(deployment)?.get(key).map(String::as_str)
}

/// Set `key` on the pod template, creating the metadata on the way.
pub fn write_tag(deployment: &mut Deployment, key: &str, value: String) {
    deployment
        .spec
        .get_or_insert_with(Default::default)
        .template
        .metadata
        .get_or_insert_with(Default::default)
        .annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(key.to_string(), value);
}

/// Same vocabulary as the boolean annotations written by other tooling.
fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Whether the deployment is owned by Turbine. Only the exact value `true`
/// counts.
pub fn is_managed(deployment: &Deployment) -> bool {
    read_tag(deployment, ENABLED).unwrap_or("false") == "true"
}

pub fn extract_port(deployment: &Deployment) -> i32 {
    read_tag(deployment, PORT)
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

pub fn extract_exposed(deployment: &Deployment) -> bool {
    read_tag(deployment, EXPOSED)
        .and_then(parse_flag)
        .unwrap_or(false)
}

/// Split an image reference into repository and tag. The tag follows the last
/// `:` unless that colon belongs to a registry host (`host:5000/app`).
pub fn split_image(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        Some((repository, tag)) if !tag.contains('/') => (repository, tag),
        _ => (image, DEFAULT_TAG),
    }
}

/// Whether any container of the deployment runs `repository:tag`.
pub fn image_matches(deployment: &Deployment, repository: &str, tag: &str) -> bool {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .map(|pod| {
            pod.containers.iter().any(|container| {
                let image = container.image.as_deref().unwrap_or_default();
                split_image(image) == (repository, tag)
            })
        })
        .unwrap_or(false)
}
