//! Heart Risk Form — Binary Entrypoint
//! Boots the Axum HTTP server: loads config and artifacts, then serves the
//! form, the JSON API and metrics.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    heart_risk_form::init_tracing();

    // Missing or corrupt artifacts abort startup here.
    let router = heart_risk_form::app().await?;

    Ok(router.into())
}
