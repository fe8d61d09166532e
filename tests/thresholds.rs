// tests/thresholds.rs
//
// Self-calibrating boundary test for the 0.5 decision threshold via public
// /api/predict. The classifier stub scores each row with its (unscaled)
// risk_index column, so sweeping ST depression walks the score across 0.5.
// Optimized with a cached Router (tokio::sync::OnceCell).

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use http::StatusCode;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tower::ServiceExt; // for `oneshot`

use heart_risk_form::artifacts::{Classifier, StandardScaler};
use heart_risk_form::error::PredictionError;
use heart_risk_form::features::FEATURE_COUNT;
use heart_risk_form::{router, AppState};

struct RiskIndexScore;

impl Classifier for RiskIndexScore {
    fn input_width(&self) -> usize {
        FEATURE_COUNT
    }
    fn predict(&self, row: &[f64]) -> Result<f64, PredictionError> {
        Ok(row[FEATURE_COUNT - 1])
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    label: String,
    at_risk: bool,
    score: f64,
}

// --- Router cache (build once per test binary) ---
static ROUTER: OnceCell<axum::Router> = OnceCell::const_new();

async fn test_app() -> axum::Router {
    ROUTER
        .get_or_init(|| async {
            let state = AppState::new(
                Arc::new(StandardScaler::identity(FEATURE_COUNT)),
                Arc::new(RiskIndexScore),
            );
            router(state)
        })
        .await
        .clone()
}

async fn call_predict(st_depression: f64, st_slope: i32, exercise_angina: i32) -> (StatusCode, PredictResponse) {
    let app = test_app().await;

    let payload = serde_json::json!({
        "chest_pain_type": 1,
        "max_heart_rate": 160,
        "vessels_colored": 1,
        "thalassemia_type": 2,
        "st_depression": st_depression,
        "st_slope": st_slope,
        "exercise_angina": exercise_angina
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 256 * 1024).await.unwrap();
    let body: PredictResponse = serde_json::from_slice(&bytes).expect("invalid /api/predict body");
    (status, body)
}

/// Find the smallest ST depression on the 0.1 grid that yields "at risk".
async fn find_first_at_risk(st_slope: i32, exercise_angina: i32) -> Option<f64> {
    for tenth in 0..=60 {
        let oldpeak = f64::from(tenth) / 10.0;
        let (status, r) = call_predict(oldpeak, st_slope, exercise_angina).await;
        assert_eq!(status, StatusCode::OK);
        if r.at_risk {
            return Some(oldpeak);
        }
    }
    None
}

#[tokio::test]
async fn exact_threshold_maps_to_not_at_risk() {
    // risk_index = 0.5 * 1.0 = 0.5 exactly
    let (st, r) = call_predict(1.0, 0, 0).await;
    assert_eq!(st, StatusCode::OK);
    assert!((r.score - 0.5).abs() < 1e-12);
    assert_eq!(r.label, "Not At Risk");
    assert!(!r.at_risk);
}

#[tokio::test]
async fn threshold_discovered_just_above_half() {
    let first = find_first_at_risk(0, 0).await.expect("some ST depression should be at risk");
    assert!((first - 1.1).abs() < 1e-9, "first at-risk oldpeak was {first}");

    let (_, r) = call_predict(first, 0, 0).await;
    assert_eq!(r.label, "At Risk of Heart Disease");
    assert!(r.score > 0.5);
}

#[tokio::test]
async fn slope_and_angina_shift_the_threshold() {
    // 0.5 * x - 0.3 * 2 - 0.2 > 0.5  ⇔  x > 2.6
    let first = find_first_at_risk(2, 1).await.expect("threshold within range");
    assert!((first - 2.7).abs() < 1e-9, "first at-risk oldpeak was {first}");
}

#[tokio::test]
async fn monotone_in_st_depression() {
    let mut seen_at_risk = false;
    for tenth in 0..=60 {
        let (_, r) = call_predict(f64::from(tenth) / 10.0, 1, 0).await;
        if seen_at_risk {
            assert!(r.at_risk, "label flipped back at oldpeak {}", f64::from(tenth) / 10.0);
        }
        seen_at_risk |= r.at_risk;
    }
    assert!(seen_at_risk);
}
