// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod artifacts;
pub mod clinical;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod features;
pub mod form;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::artifacts::load_artifacts;
pub use crate::clinical::ClinicalInput;
pub use crate::decision::{Prediction, RiskLabel};
pub use crate::engine::{evaluate, predict};
pub use crate::error::{ArtifactLoadError, InvalidInputError, PipelineError, PredictionError};
pub use crate::features::{assemble, FeatureVector};

use anyhow::Context as _;
use axum::Router;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the fmt subscriber. `RUST_LOG` overrides the default filter;
/// `HEART_LOG_FORMAT=json` emits JSON lines. A no-op when the runtime already
/// installed a subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("heart_risk_form=info,warn"));

    if config::app::json_logs_requested() {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init();
    }
}

/// Resolve config, load artifacts, build the router. Artifact failures are
/// fatal: no router is returned and nothing is served.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = config::AppConfig::load()?;
    info!(
        model = %cfg.model_path.display(),
        scaler = %cfg.scaler_path.display(),
        "loading artifacts"
    );
    // file reads and parsing stay off the async workers
    let state = tokio::task::spawn_blocking(move || AppState::from_config(&cfg))
        .await
        .context("artifact loader task failed")?
        .context("artifact load failed")?;
    Ok(router(state))
}
