use crate::core::proxy::WorkloadProxy;
use crate::core::ProxyError;
use crate::kubernetes::{tags, ClientError};
use backoff::ExponentialBackoffBuilder;
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, event, info, Level};

/// Bounds the optimistic-concurrency loop of a restart. Defaults follow the
/// Kubernetes client retry on conflicts: 5 attempts, 10ms apart, 10% jitter.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    pub jitter: f64,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        RestartPolicy {
            max_attempts: 5,
            interval: Duration::from_millis(10),
            jitter: 0.1,
        }
    }
}

impl RestartPolicy {
    pub fn with_attempts(max_attempts: u32) -> Self {
        RestartPolicy {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }
}

/// One read-modify-write round of the restart loop.
async fn attempt_restart(
    proxy: &WorkloadProxy,
    name: &str,
    attempt: u32,
    budget: u32,
) -> Result<(), backoff::Error<ProxyError>> {
    debug!("Trying to restart deployment {} (attempt {})", name, attempt);
    let deployments = &proxy.cluster().deployments;

    let mut deployment = deployments.get(name).await.map_err(|e| match e {
        ClientError::NotFound(_) => backoff::Error::permanent(ProxyError::NotFound(name.to_string())),
        other => backoff::Error::permanent(ProxyError::Upstream(other)),
    })?;
    if !tags::is_managed(&deployment) {
        return Err(backoff::Error::permanent(ProxyError::NotManaged(
            name.to_string(),
        )));
    }

    tags::write_tag(&mut deployment, tags::RESTARTED_AT, Utc::now().to_rfc3339());
    match deployments.replace(name, &deployment).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_conflict() && attempt < budget => {
            Err(backoff::Error::transient(ProxyError::Upstream(e)))
        }
        Err(e) if e.is_conflict() => Err(backoff::Error::permanent(
            ProxyError::ConflictExceeded {
                name: name.to_string(),
                attempts: attempt,
            },
        )),
        Err(e) => Err(backoff::Error::permanent(ProxyError::Upstream(e))),
    }
}

/// Roll every replica of `name` by stamping the restart annotation on its
/// pod template.
///
/// Each attempt reads the deployment and submits it back with the read
/// revision. Only a revision conflict is retried; any other failure, or the
/// last conflict of the budget, ends the restart.
pub async fn restart(proxy: &WorkloadProxy, name: &str) -> Result<(), ProxyError> {
    let policy = proxy.restart_policy();
    let backoff = ExponentialBackoffBuilder::new()
        .with_initial_interval(policy.interval)
        .with_multiplier(1.0)
        .with_randomization_factor(policy.jitter)
        .with_max_elapsed_time(None)
        .build();

    let attempts = AtomicU32::new(0);
    let attempts = &attempts;
    let budget = policy.max_attempts;

    let operation = move || async move {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        attempt_restart(proxy, name, attempt, budget).await
    };

    backoff::future::retry_notify(backoff, operation, |e, next: Duration| {
        event!(
            Level::WARN,
            "Restart of {} rejected ({}), retrying in {}ms",
            name,
            e,
            next.as_millis()
        );
    })
    .await?;

    info!("Deployment {} restarted", name);
    Ok(())
}
