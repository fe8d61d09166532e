// tests/metrics.rs
use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use heart_risk_form::artifacts::{Classifier, StandardScaler};
use heart_risk_form::error::PredictionError;
use heart_risk_form::features::FEATURE_COUNT;
use heart_risk_form::{router, AppState};

struct Fixed(f64);

impl Classifier for Fixed {
    fn input_width(&self) -> usize {
        FEATURE_COUNT
    }
    fn predict(&self, _row: &[f64]) -> Result<f64, PredictionError> {
        Ok(self.0)
    }
}

fn build_app() -> Router {
    router(AppState::new(
        Arc::new(StandardScaler::identity(FEATURE_COUNT)),
        Arc::new(Fixed(0.9)),
    ))
}

async fn scrape(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    String::from_utf8(body.to_vec()).unwrap()
}

async fn predict(app: &Router, payload: &str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::post("/api/predict")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn metrics_endpoint_reports_outcomes() {
    let app = build_app();

    let ok = r#"{"chest_pain_type":0,"max_heart_rate":150,"vessels_colored":0,"thalassemia_type":1,"st_depression":1.0,"st_slope":0,"exercise_angina":0}"#;
    let bad = r#"{"chest_pain_type":9,"max_heart_rate":150,"vessels_colored":0,"thalassemia_type":1,"st_depression":1.0,"st_slope":0,"exercise_angina":0}"#;

    assert_eq!(predict(&app, ok).await, StatusCode::OK);
    assert_eq!(predict(&app, bad).await, StatusCode::UNPROCESSABLE_ENTITY);

    let text = scrape(&app).await;
    for needle in [
        "heart_predictions_total",
        "label=\"at_risk\"",
        "heart_invalid_input_total",
        "heart_prediction_duration_ms",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}

#[tokio::test]
async fn second_router_shares_the_recorder() {
    // Installing twice in one process must not disable /metrics.
    let a = build_app();
    let b = build_app();
    let _ = scrape(&a).await;
    let _ = scrape(&b).await;
}
