// * HTTP API server
// * One hyper server; every route shares the same AppState.

pub mod api;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;

use crate::automation::Scheduler;
use crate::config::AppConfig;
use crate::engine::auditor::SiteAuditor;
use crate::keywords::rankings::{RankingSource, UnavailableRankings};
use crate::network::{FetchError, PageFetcher, PageSource};
use crate::ops::{alert_manager_from_config, AlertManager};
use crate::persistence::{MonitoringStore, ReportStore};

pub use api::{handle_request, ApiError};

/// Everything a request handler or scheduled task needs
#[derive(Debug)]
pub struct AppState {
    pub config: AppConfig,
    pub auditor: Arc<SiteAuditor>,
    pub history: Arc<MonitoringStore>,
    pub store: ReportStore,
    pub alerts: Arc<AlertManager>,
    pub scheduler: Arc<Scheduler>,
    pub started_at: Instant,
}

impl AppState {
    /// Live wiring: reqwest fetcher, configured alert channels, no ranking provider
    pub fn from_config(config: AppConfig) -> Result<Self, FetchError> {
        let fetcher = PageFetcher::with_config(&config.fetch)?;
        let robots_token = fetcher.identity().robots_token.clone();
        Ok(Self::with_sources(
            config,
            Arc::new(fetcher),
            &robots_token,
            Arc::new(UnavailableRankings),
        ))
    }

    /// Wiring with explicit page and ranking sources
    pub fn with_sources(
        config: AppConfig,
        pages: Arc<dyn PageSource>,
        robots_token: &str,
        rankings: Arc<dyn RankingSource>,
    ) -> Self {
        let auditor = Arc::new(SiteAuditor::new(pages, robots_token, config.batch.clone()));
        let history = Arc::new(MonitoringStore::new(config.history_capacity));
        let store = ReportStore::new(&config.data_dir);
        let alerts = Arc::new(alert_manager_from_config(&config));
        let scheduler = Arc::new(Scheduler::new(
            config.clone(),
            Arc::clone(&auditor),
            Arc::clone(&history),
            store.clone(),
            Arc::clone(&alerts),
            rankings,
        ));

        Self {
            config,
            auditor,
            history,
            store,
            alerts,
            scheduler,
            started_at: Instant::now(),
        }
    }
}

/// Handle for shutting down the API server
pub struct ServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    running: Arc<AtomicBool>,
    join_handle: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stops accepting connections and waits for in-flight requests
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.join_handle.await;
    }
}

/// Binds `addr` and serves the API in a background task
pub fn start_server(state: Arc<AppState>, addr: SocketAddr) -> Result<(ServerHandle, SocketAddr), hyper::Error> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    let make_svc = hyper::service::make_service_fn(move |_conn| {
        let state = Arc::clone(&state);
        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req| {
                handle_request(Arc::clone(&state), req)
            }))
        }
    });

    let server = hyper::Server::try_bind(&addr)?.serve(make_svc);
    let local_addr = server.local_addr();
    let server = server.with_graceful_shutdown(async {
        let _ = shutdown_rx.await;
    });

    tracing::info!(addr = %local_addr, "API server started");

    let join_handle = tokio::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!(error = %e, "API server error");
        }
        running_clone.store(false, Ordering::Relaxed);
        tracing::info!("API server stopped");
    });

    Ok((
        ServerHandle {
            shutdown_tx: Some(shutdown_tx),
            running,
            join_handle,
        },
        local_addr,
    ))
}
