use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

/// Turbine workload manager.
#[derive(Parser, Debug)]
#[command(version, author)]
pub struct Cli {
    /// Namespace holding the Turbine applications.
    #[arg(long, env = "TURBINE_NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// Connect from outside the cluster through a kubeconfig file instead of
    /// the in-cluster service account.
    #[arg(long, env = "REMOTE")]
    pub remote: bool,

    /// Kubeconfig used in remote mode, the default lookup otherwise.
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Number of threads serving HTTP requests.
    #[arg(long, env = "TURBINE_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Seconds given to the orchestrator to answer one request.
    #[arg(long, env = "TURBINE_REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    /// Replace attempts before a restart gives up on conflicts.
    #[arg(long, env = "TURBINE_RESTART_ATTEMPTS", default_value_t = 5)]
    pub restart_attempts: u32,

    /// The level of verbosity.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn verbosity_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}
