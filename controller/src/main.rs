mod api;
mod cli;
mod core;
mod kubernetes;

use crate::api::external::{Context, Server};
use crate::cli::Cli;
use crate::core::proxy::WorkloadProxy;
use crate::core::reactor::RegistryReactor;
use crate::core::restart::RestartPolicy;
use clap::Parser;
use std::sync::Arc;
use tokio::runtime::Builder;
use tracing::level_filters::LevelFilter;
use tracing::{error, event, Level};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logger(level: LevelFilter) {
    tracing_subscriber::registry()
        .with(fmt::layer().compact())
        .with(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logger(cli.verbosity_level());
    event!(Level::INFO, "Starting Turbine in namespace {}", cli.namespace);

    let runtime = match Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Unable to start the async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let cluster = runtime
        .block_on(kubernetes::client::connect(&cli))
        .unwrap_or_else(|e| {
            error!("Unable to reach the orchestrator: {}", e);
            std::process::exit(1);
        });

    let proxy = Arc::new(WorkloadProxy::new(
        cluster,
        RestartPolicy::with_attempts(cli.restart_attempts),
    ));
    let context = Context::new(
        proxy.clone(),
        RegistryReactor::new(proxy),
        runtime.handle().clone(),
        cli.request_timeout(),
    );

    let server = Server::new(context, cli.host.clone(), cli.port, cli.workers);
    if let Err(e) = server.run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
