//! Axum server assembly and lifecycle.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use facegate_liveness::{
    ActionAnalyzer, AuditSink, ChallengeIssuer, FaceMatcher, LivenessVerifier, RemoteFaceEngine,
    StaticDirectory, TenantDirectory, TracingAudit,
};
use facegate_types::Timestamp;
use facegate_utils::StatsCounter;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::error::RpcError;
use crate::handlers;

/// Frame uploads are small JPEG stills; 8 MiB leaves generous headroom.
const BODY_LIMIT_BYTES: usize = 8 * 1024 * 1024;

const COUNTERS: &[&str] = &[
    "challenges_issued",
    "challenges_purged",
    "verify_ok",
    "verify_failed",
    "verify_rejected",
];

/// Shared state behind every handler.
pub struct AppState {
    pub config: ServiceConfig,
    pub issuer: Arc<ChallengeIssuer>,
    pub verifier: LivenessVerifier,
    pub directory: Arc<dyn TenantDirectory>,
    pub stats: StatsCounter,
}

impl AppState {
    /// Assemble state from explicit capabilities. Tests inject nullables
    /// here; production uses [`RpcServer::from_config`].
    pub fn new(
        config: ServiceConfig,
        analyzer: Arc<dyn ActionAnalyzer>,
        matcher: Arc<dyn FaceMatcher>,
        directory: Arc<dyn TenantDirectory>,
        audit: Arc<dyn AuditSink>,
    ) -> Arc<Self> {
        let issuer = Arc::new(ChallengeIssuer::new(config.liveness.clone()));
        let verifier = LivenessVerifier::new(Arc::clone(&issuer), analyzer, matcher, audit);
        Arc::new(Self {
            config,
            issuer,
            verifier,
            directory,
            stats: StatsCounter::new(COUNTERS),
        })
    }
}

/// Build the application router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);
    Router::new()
        .route("/", get(handlers::health))
        .route("/live/challenge", get(handlers::issue_challenge))
        .route("/live/verify", post(handlers::verify))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &ServiceConfig) -> CorsLayer {
    if config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// The FaceGate HTTP server.
pub struct RpcServer {
    state: Arc<AppState>,
}

impl RpcServer {
    /// Wire production capabilities from the config: the remote face
    /// engine for analysis and matching, the config-backed directory, and
    /// tracing-based audit.
    pub fn from_config(config: ServiceConfig) -> Self {
        let engine = Arc::new(RemoteFaceEngine::new(config.engine_url.clone()));
        let directory = Arc::new(StaticDirectory::new(&config.directory));
        let state = AppState::new(
            config,
            Arc::clone(&engine) as Arc<dyn ActionAnalyzer>,
            engine as Arc<dyn FaceMatcher>,
            directory,
            Arc::new(TracingAudit),
        );
        Self { state }
    }

    pub fn with_state(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Serve until ctrl-c. Runs the expired-challenge reaper alongside the
    /// listener when configured.
    pub async fn start(&self) -> Result<(), RpcError> {
        let started = std::time::Instant::now();
        let reaper = self.spawn_reaper();

        let addr = format!("0.0.0.0:{}", self.state.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {addr}: {e}")))?;
        info!("FaceGate API listening on {addr}");

        let app = router(Arc::clone(&self.state));
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;

        if let Some(reaper) = reaper {
            reaper.abort();
        }
        info!(
            uptime = %facegate_utils::format_duration(started.elapsed().as_secs()),
            stats = %self.state.stats.summary(),
            "FaceGate API stopped"
        );
        Ok(())
    }

    fn spawn_reaper(&self) -> Option<tokio::task::JoinHandle<()>> {
        let interval_secs = self.state.config.reaper_interval_secs;
        if interval_secs == 0 {
            return None;
        }
        let state = Arc::clone(&self.state);
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            interval.tick().await; // the first tick fires immediately
            loop {
                interval.tick().await;
                let purged = state.issuer.purge_expired(Timestamp::now());
                state.stats.add("challenges_purged", purged as u64);
            }
        }))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
    }
}
