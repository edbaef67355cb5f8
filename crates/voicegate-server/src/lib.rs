//! voicegate HTTP service.
//!
//! # Modules
//!
//! - [`routes`] - synthesis, plan sync, billing webhook, health and metrics
//! - [`db`] - SQLite account store and local identity claims
//! - [`auth`] - bearer credential verification
//! - [`tts`] - Google Cloud Text-to-Speech client
//! - [`state`] - shared [`AppState`]
//! - [`metrics`] - Prometheus counters

pub mod auth;
pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod tts;

pub use config::ServerConfig;
pub use db::Database;
pub use error::ApiError;
pub use state::AppState;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
