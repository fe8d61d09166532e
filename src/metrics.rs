use axum::{routing::get, Router};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::decision::RiskLabel;

// A process can hold only one global recorder; routers built later (tests) reuse it.
static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process).
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

pub fn record_prediction(label: RiskLabel, elapsed_ms: f64) {
    counter!("heart_predictions_total", "label" => label.metric_tag()).increment(1);
    histogram!("heart_prediction_duration_ms").record(elapsed_ms);
}

pub fn record_invalid_input() {
    counter!("heart_invalid_input_total").increment(1);
}

pub fn record_prediction_error() {
    counter!("heart_prediction_errors_total").increment(1);
}
