//! HTTP host for the Docket workflow.
//!
//! Wires a [`Workflow`] over any [`IncidentStore`] into the JSON API under
//! `/api`, with request tracing.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use docket_core::{Workflow, store::IncidentStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `DOCKET_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/docket/docket.db") }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router: the API nested under `/api`.
pub fn router<S>(workflow: Arc<Workflow<S>>) -> Router
where
  S: IncidentStore + 'static,
{
  Router::new()
    .nest("/api", docket_api::api_router(workflow))
    .layer(TraceLayer::new_for_http())
}
