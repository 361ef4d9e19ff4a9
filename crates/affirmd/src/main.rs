// # affirmd - Affirmation Daemon
//
// This daemon is a THIN integration layer:
// - DO NOT add aggregation, filtering or cache logic here
// - All of that lives in affirm-core
//
// The affirmd daemon is responsible for:
// 1. Reading configuration from environment variables (and an optional JSON file)
// 2. Initializing logging and the runtime
// 3. Building the Reddit source and the affirmation service
// 4. Routing HTTP requests to the service
//
// ## Configuration
//
// ### Service
// - `AFFIRM_CONFIG`: Path to a JSON config file (optional; env vars below override it)
// - `AFFIRM_TOPICS`: Comma-separated list of topics (subreddits)
// - `AFFIRM_CACHE_TTL_SECS`: Seconds a snapshot is served before refreshing
// - `AFFIRM_PER_TOPIC_LIMIT`: Items requested per topic
// - `AFFIRM_TIMEFRAME`: hour, day, week, month, year or all
// - `AFFIRM_MAX_LINE_LENGTH`: Longest acceptable line, in characters
// - `AFFIRM_DENYLIST`: Comma-separated denylisted terms (replaces the defaults)
//
// ### Source
// - `AFFIRM_SOURCE_BASE_URL`: Feed host
// - `AFFIRM_USER_AGENT`: Client identifier sent with every request
// - `AFFIRM_TIMEOUT_SECS`: Per-request timeout
//
// ### Daemon
// - `AFFIRM_BIND`: Listen address (default 0.0.0.0:8000)
// - `AFFIRM_LOG_LEVEL`: trace, debug, info, warn or error
//
// ## Routes
//
// - `GET /random`, `GET /api/random`: One random item, 503 if none
// - `GET /healthz`, `GET /api/healthz`: Item count and snapshot age
//
// Every route answers cross-origin requests from any origin.
//
// ## Example
//
// ```bash
// export AFFIRM_TOPICS=dadjokes,punny,Oneliners
// export AFFIRM_CACHE_TTL_SECS=1800
// export AFFIRM_BIND=127.0.0.1:8000
//
// affirmd
// ```

use affirm_core::{AffirmConfig, AffirmationService, Timeframe};
use affirm_source_reddit::RedditSource;
use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum AffirmExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<AffirmExitCode> for ExitCode {
    fn from(code: AffirmExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
struct Config {
    service: AffirmConfig,
    bind: SocketAddr,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let mut service = match env::var("AFFIRM_CONFIG") {
            Ok(path) => AffirmConfig::from_json_file(&path)
                .with_context(|| format!("Failed to load AFFIRM_CONFIG file {}", path))?,
            Err(_) => AffirmConfig::default(),
        };

        if let Some(topics) = env_list("AFFIRM_TOPICS") {
            service.topics = topics;
        }
        if let Some(ttl) = env_parse::<u64>("AFFIRM_CACHE_TTL_SECS")? {
            service.cache_ttl_secs = ttl;
        }
        if let Some(limit) = env_parse::<usize>("AFFIRM_PER_TOPIC_LIMIT")? {
            service.per_topic_limit = limit;
        }
        if let Some(timeframe) = env_parse::<Timeframe>("AFFIRM_TIMEFRAME")? {
            service.timeframe = timeframe;
        }
        if let Some(max_len) = env_parse::<usize>("AFFIRM_MAX_LINE_LENGTH")? {
            service.max_line_length = max_len;
        }
        if let Some(terms) = env_list("AFFIRM_DENYLIST") {
            service.denylist_terms = terms;
        }
        if let Ok(base_url) = env::var("AFFIRM_SOURCE_BASE_URL") {
            service.source.base_url = base_url;
        }
        if let Ok(user_agent) = env::var("AFFIRM_USER_AGENT") {
            service.source.user_agent = user_agent;
        }
        if let Some(timeout) = env_parse::<u64>("AFFIRM_TIMEOUT_SECS")? {
            service.source.timeout_secs = timeout;
        }

        let bind = env::var("AFFIRM_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind = bind
            .parse()
            .with_context(|| format!("AFFIRM_BIND '{}' is not a valid socket address", bind))?;

        Ok(Self {
            service,
            bind,
            log_level: env::var("AFFIRM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.service.validate()?;

        if self.service.cache_ttl_secs == 0 {
            anyhow::bail!(
                "AFFIRM_CACHE_TTL_SECS must be > 0, or every request would refetch all topics"
            );
        }

        if !(1..=100).contains(&self.service.per_topic_limit) {
            anyhow::bail!(
                "AFFIRM_PER_TOPIC_LIMIT must be between 1 and 100. Got: {}",
                self.service.per_topic_limit
            );
        }

        let base_url = &self.service.source.base_url;
        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            anyhow::bail!(
                "AFFIRM_SOURCE_BASE_URL must use HTTP or HTTPS scheme. Got: {}",
                base_url
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "AFFIRM_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Comma-separated env var, blanks dropped; `None` if unset
fn env_list(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

/// Parsed env var; `None` if unset, an error if set but unparseable
fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} '{}' is invalid: {}", name, raw, e)),
        Err(_) => Ok(None),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return AffirmExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return AffirmExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AffirmExitCode::ConfigError.into();
    }

    info!("Starting affirmd daemon");
    info!(
        "Configuration loaded: {} topic(s), ttl {}s, user agent '{}'",
        config.service.topics.len(),
        config.service.cache_ttl_secs,
        config.service.source.user_agent
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AffirmExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            AffirmExitCode::RuntimeError
        } else {
            AffirmExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let source = Arc::new(RedditSource::new(&config.service.source)?);
    let service = Arc::new(AffirmationService::new(source, config.service)?);

    // Warm the cache in the background; requests are served from the
    // fallback seed until it lands. The seed is always stale, so this
    // refreshes unless a request already did.
    let warmup = Arc::clone(&service);
    tokio::spawn(async move {
        let outcome = warmup.refresh_if_stale().await;
        info!("Warm-up refresh finished: {:?}", outcome);
    });

    let app = app(service);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match wait_for_shutdown().await {
                Ok(signal) => info!("Received shutdown signal: {}", signal),
                Err(e) => error!("Shutdown signal error: {}", e),
            }
        })
        .await
        .context("HTTP server failed")?;

    info!("Daemon stopped");
    Ok(())
}

type SharedService = Arc<AffirmationService>;

/// Full router: root and `/api` mounts behind a permissive CORS policy
fn app(service: SharedService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .with_state(service)
        .layer(cors)
}

fn routes() -> Router<SharedService> {
    Router::new()
        .route("/random", get(random_affirmation))
        .route("/healthz", get(healthz))
}

async fn random_affirmation(State(service): State<SharedService>) -> Response {
    match service.random_affirmation().await {
        Ok(item) => Json(item).into_response(),
        Err(e) if e.is_unavailable() => {
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "detail": e.to_string() })))
                .into_response()
        }
        Err(e) => {
            error!("Failed to serve affirmation: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "internal error" })),
            )
                .into_response()
        }
    }
}

async fn healthz(State(service): State<SharedService>) -> Json<serde_json::Value> {
    let health = service.health().await;
    Json(json!({
        "ok": true,
        "count": health.item_count,
        "age_sec": health.age_seconds,
    }))
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
