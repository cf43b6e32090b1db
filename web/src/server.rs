//! HTTP server — shared state, route table and request accounting

use anyhow::{Context, Result};
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use progour_tools::{CommandRunner, InstallPlanner, InstallProbe, Registry};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::{api, pages};

/// Number of requests accepted since the server started
#[derive(Debug, Clone, Default)]
pub struct RequestCounter(Arc<AtomicU64>);

impl RequestCounter {
    /// Record one request and return the new total
    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutionLimits {
    pub command_timeout: Duration,
    pub install_timeout: Duration,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            command_timeout: progour_tools::DEFAULT_COMMAND_TIMEOUT,
            install_timeout: progour_tools::DEFAULT_INSTALL_TIMEOUT,
        }
    }
}

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub runner: Arc<dyn CommandRunner>,
    pub probe: Arc<dyn InstallProbe>,
    pub installer: Arc<InstallPlanner>,
    pub limits: ExecutionLimits,
    pub web_root: PathBuf,
    pub host: String,
    pub port: u16,
    pub requests: RequestCounter,
}

impl AppState {
    pub fn new(
        registry: Registry,
        runner: Arc<dyn CommandRunner>,
        probe: Arc<dyn InstallProbe>,
        installer: InstallPlanner,
        web_root: PathBuf,
    ) -> Self {
        Self {
            registry,
            runner,
            probe,
            installer: Arc::new(installer),
            limits: ExecutionLimits::default(),
            web_root,
            host: "0.0.0.0".into(),
            port: 8080,
            requests: RequestCounter::default(),
        }
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Build the route table
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/tools", get(api::list_tools))
        .route("/execute", post(api::execute))
        .route("/system", get(api::system_info))
        .route("/status", get(api::server_status))
        .route("/install", post(api::install))
        .fallback(api::not_found);

    let static_files = ServeDir::new(&state.web_root).append_index_html_on_directories(true);

    Router::new()
        .nest("/api", api_routes)
        .route("/tools/:name", get(pages::tool_page))
        .fallback_service(static_files)
        .layer(cors)
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .with_state(state)
}

async fn count_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let total = state.requests.increment();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".into());
    info!(
        "[WEB] {peer} - {} {} (#{total})",
        request.method(),
        request.uri().path()
    );
    next.run(request).await
}

/// A running HTTP server
pub struct Server {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Server {
    /// Bind `host:port` and start serving in the background
    pub async fn start(mut state: AppState, host: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("Failed to bind {host}:{port}"))?;
        let addr = listener
            .local_addr()
            .context("Failed to read bound address")?;

        state.host = host.to_string();
        state.port = addr.port();
        let app = router(state);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let served = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
            if let Err(e) = served {
                warn!("HTTP server stopped with error: {e}");
            }
        });

        Ok(Server {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal graceful shutdown; in-flight requests are allowed to finish
    pub fn shutdown(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }
    }

    /// Wait for the serving task to finish
    pub async fn join(mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.await.context("HTTP server task failed")?;
        }
        Ok(())
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Addresses this host is reachable on, for the startup banner
pub async fn network_addresses(runner: &dyn CommandRunner) -> Vec<String> {
    let result = runner.run("hostname -I", Duration::from_secs(5)).await;
    let addresses: Vec<String> = if result.is_success() {
        result.output.split_whitespace().map(str::to_string).collect()
    } else {
        Vec::new()
    };

    if addresses.is_empty() {
        vec!["127.0.0.1".to_string()]
    } else {
        addresses
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use progour_tools::ExecutionResult;
    use std::collections::{HashMap, HashSet};
    use std::path::Path;
    use std::sync::Mutex;

    /// Probe answering from a mutable set of installed executables
    #[derive(Default)]
    pub struct FixedProbe {
        installed: Mutex<HashSet<String>>,
    }

    impl FixedProbe {
        pub fn with(names: &[&str]) -> Self {
            let probe = Self::default();
            for name in names {
                probe.set(name, true);
            }
            probe
        }

        pub fn set(&self, name: &str, installed: bool) {
            let mut set = self.installed.lock().unwrap();
            if installed {
                set.insert(name.to_string());
            } else {
                set.remove(name);
            }
        }
    }

    #[async_trait]
    impl InstallProbe for FixedProbe {
        async fn is_installed(&self, executable: &str) -> bool {
            self.installed.lock().unwrap().contains(executable)
        }
    }

    /// Runner returning canned results and recording every call
    #[derive(Default)]
    pub struct ScriptedRunner {
        results: HashMap<String, ExecutionResult>,
        pub calls: Mutex<Vec<(String, Duration)>>,
    }

    impl ScriptedRunner {
        pub fn with(mut self, command_line: &str, result: ExecutionResult) -> Self {
            self.results.insert(command_line.to_string(), result);
            self
        }

        pub fn calls(&self) -> Vec<(String, Duration)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, command_line: &str, timeout: Duration) -> ExecutionResult {
            self.calls
                .lock()
                .unwrap()
                .push((command_line.to_string(), timeout));
            self.results
                .get(command_line)
                .cloned()
                .unwrap_or_else(|| ExecutionResult::success(String::new()))
        }
    }

    pub struct PanickingRunner;

    #[async_trait]
    impl CommandRunner for PanickingRunner {
        async fn run(&self, _command_line: &str, _timeout: Duration) -> ExecutionResult {
            panic!("runner blew up");
        }
    }

    pub fn state(
        web_root: &Path,
        runner: Arc<dyn CommandRunner>,
        probe: Arc<dyn InstallProbe>,
    ) -> AppState {
        AppState::new(
            Registry::builtin(),
            runner,
            probe,
            InstallPlanner::builtin(),
            web_root.to_path_buf(),
        )
    }

    /// Start a server on an ephemeral loopback port and return its base URL
    pub async fn spawn(state: AppState) -> (Server, String) {
        let server = Server::start(state, "127.0.0.1", 0).await.unwrap();
        let base = format!("http://{}", server.addr());
        (server, base)
    }
}
