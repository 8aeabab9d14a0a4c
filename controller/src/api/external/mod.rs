mod routes;

use crate::api::ApiError;
use crate::core::proxy::WorkloadProxy;
use crate::core::reactor::RegistryReactor;
use crate::core::ProxyError;
use routes::Router;
use colored::Colorize;
use std::future::Future;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiny_http::{Request, Response, Server as TinyServer, StatusCode};
use tokio::runtime::Handle;
use tracing::{error, event, warn, Level};

/// Everything a route needs to serve a request.
pub struct Context {
    pub proxy: Arc<WorkloadProxy>,
    pub reactor: RegistryReactor,
    runtime: Handle,
    request_timeout: Duration,
}

impl Context {
    pub fn new(
        proxy: Arc<WorkloadProxy>,
        reactor: RegistryReactor,
        runtime: Handle,
        request_timeout: Duration,
    ) -> Context {
        Context {
            proxy,
            reactor,
            runtime,
            request_timeout,
        }
    }

    /// Drive `operation` to completion from a server thread. Past the request
    /// deadline the operation is dropped, which cancels the orchestrator call
    /// in flight.
    pub fn block_on<F, T>(&self, operation: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ProxyError>>,
    {
        let timeout = self.request_timeout;
        self.runtime
            .block_on(async { tokio::time::timeout(timeout, operation).await })
            .map_err(|_| ApiError::Timeout(timeout))?
            .map_err(ApiError::from)
    }
}

pub struct Server {
    context: Arc<Context>,
    host: String,
    port: u16,
    workers: usize,
}

impl Server {
    pub fn new(context: Context, host: String, port: u16, workers: usize) -> Server {
        Server {
            context: Arc::new(context),
            host,
            port,
            workers: workers.max(1),
        }
    }

    /// Serve requests until the listener fails; blocks the calling thread.
    pub fn run(&self) -> anyhow::Result<()> {
        let address = format!("{}:{}", self.host, self.port);
        let server = TinyServer::http(&address)
            .map_err(|e| anyhow::anyhow!("Unable to listen on {}: {}", address, e))?;
        let server = Arc::new(server);

        let mut guards = Vec::with_capacity(self.workers);
        for _ in 0..self.workers {
            let server = server.clone();
            let context = self.context.clone();

            let guard = thread::spawn(move || {
                let router = Router::new();
                loop {
                    let request: Request = match server.recv() {
                        Ok(request) => request,
                        Err(e) => {
                            error!("Unable to receive request: {}", e);
                            break;
                        }
                    };
                    serve(&router, request, &context);
                }
            });
            guards.push(guard);
        }
        event!(
            Level::INFO,
            "{}",
            format!("Server running on http://{}", address).green()
        );

        for guard in guards {
            if guard.join().is_err() {
                error!("A server thread panicked");
            }
        }
        Ok(())
    }
}

fn serve(router: &Router, mut request: Request, context: &Context) {
    let response = router.handle(&mut request, context).unwrap_or_else(|| {
        warn!("Route not found: {} {}", request.method(), request.url());
        Response::from_string("Route not found").with_status_code(StatusCode(404))
    });
    if let Err(e) = request.respond(response) {
        error!("Unable to send response: {}", e);
    }
}
