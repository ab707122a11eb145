//! HTTP server - the public face of the plugin registry.
//!
//! Routes:
//! - `GET /api/repo/{plugin}`   repository URL, or `404` text
//! - `GET /api/readme/{plugin}` README text or a descriptive message
//! - `GET /api/info/{plugin}`   manifest JSON or a descriptive message
//! - `GET /api/search/{query}`  JSON array of matching plugin ids
//! - `GET /`                    index page
//! - `GET /plugin/{name}`       plugin page with `{plugin_name}` substituted
//! - `GET /health`              liveness
//!
//! Lookup misses and fetch failures are answered with 200 and a message,
//! never with an error status.

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::fs;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::{AppConfig, PagesConfig};
use crate::fetcher::{BranchFetcher, HttpTransport, TransportError};
use crate::registry::{Registry, RegistryError};
use crate::resolver::{
    ManifestLookup, RemoteFile, Resolver, MISSING_ENTRY_MESSAGE, MISSING_PLUGIN_MESSAGE,
};

/// Placeholder substituted in the plugin page template
pub const PLUGIN_NAME_PLACEHOLDER: &str = "{plugin_name}";

/// Errors that prevent the server from starting
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to read page template {path}: {source}")]
    Page {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Transport(#[from] TransportError),
}

/// Static page templates, read once at startup
#[derive(Debug, Clone)]
pub struct Pages {
    index: String,
    plugin: String,
}

impl Pages {
    pub fn new(index: impl Into<String>, plugin: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            plugin: plugin.into(),
        }
    }

    pub fn load(config: &PagesConfig) -> Result<Self, ServerError> {
        Ok(Self {
            index: read_page(&config.index)?,
            plugin: read_page(&config.plugin)?,
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Plugin page with the first placeholder replaced by `name`
    pub fn plugin(&self, name: &str) -> String {
        self.plugin.replacen(PLUGIN_NAME_PLACEHOLDER, name, 1)
    }
}

fn read_page(path: &FsPath) -> Result<String, ServerError> {
    fs::read_to_string(path).map_err(|source| ServerError::Page {
        path: path.to_path_buf(),
        source,
    })
}

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub pages: Arc<Pages>,
}

impl AppState {
    pub fn new(resolver: Resolver, pages: Pages) -> Self {
        Self {
            resolver: Arc::new(resolver),
            pages: Arc::new(pages),
        }
    }

    /// Load the registry and pages and build the HTTP transport from config
    pub fn from_config(config: &AppConfig) -> Result<Self, ServerError> {
        let registry = Arc::new(Registry::load(&config.registry.path)?);
        let pages = Pages::load(&config.pages)?;
        let transport = Arc::new(HttpTransport::new(&config.fetch.user_agent)?);
        let fetcher =
            BranchFetcher::new(transport).with_github_raw_base(&config.fetch.github_raw_base);

        Ok(Self::new(Resolver::new(registry, fetcher), pages))
    }
}

/// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(index_page))
        .route("/plugin/{name}", get(plugin_page))
        .route("/api/repo/{plugin}", get(repo_entry))
        .route("/api/readme/{plugin}", get(readme))
        .route("/api/info/{plugin}", get(info))
        .route("/api/search/{query}", get(search))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "plugin-registry",
        "version": env!("CARGO_PKG_VERSION"),
        "plugins": state.resolver.registry().len(),
    }))
}

async fn index_page(State(state): State<AppState>) -> impl IntoResponse {
    Html(state.pages.index().to_string())
}

async fn plugin_page(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    Html(state.pages.plugin(&name))
}

async fn repo_entry(State(state): State<AppState>, Path(plugin): Path<String>) -> String {
    state
        .resolver
        .repo_url(&plugin)
        .unwrap_or(MISSING_ENTRY_MESSAGE)
        .to_string()
}

// Resolutions run on their own task so a client disconnect does not abort
// in-flight fetches.

async fn readme(State(state): State<AppState>, Path(plugin): Path<String>) -> String {
    let resolver = state.resolver.clone();
    let task = tokio::spawn(async move { resolver.resolve_readme(&plugin).await });

    match task.await {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "README resolution task failed");
            RemoteFile::Readme.not_found_message().to_string()
        }
    }
}

async fn info(State(state): State<AppState>, Path(plugin): Path<String>) -> Response {
    let resolver = state.resolver.clone();
    let task = tokio::spawn(async move { resolver.resolve_manifest(&plugin).await });

    let lookup = match task.await {
        Ok(lookup) => lookup,
        Err(e) => {
            error!(error = %e, "Manifest resolution task failed");
            ManifestLookup::Message(RemoteFile::Manifest.not_found_message().to_string())
        }
    };

    match lookup {
        ManifestLookup::Manifest(manifest) => Json(manifest).into_response(),
        ManifestLookup::Message(message) => message.into_response(),
    }
}

async fn search(State(state): State<AppState>, Path(query): Path<String>) -> Json<Vec<String>> {
    Json(state.resolver.search(&query))
}

/// Start the server and run until Ctrl-C
pub async fn start_server(config: AppConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::from_config(&config)?;
    info!(
        plugins = state.resolver.registry().len(),
        registry = %config.registry.path.display(),
        "Registry ready"
    );
    if state.resolver.registry().is_empty() {
        info!("Registry is empty; every lookup will answer '{}'", MISSING_PLUGIN_MESSAGE);
    }

    let app = create_router(state);

    info!(address = %addr, "Starting plugin registry server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received, stopping server...");
        })
        .await?;

    Ok(())
}
