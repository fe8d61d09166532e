use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, warn};

use crate::artifacts::{load_artifacts, Classifier, Scaler};
use crate::clinical::{ClinicalInput, SubmittedInput, FORM_FIELDS};
use crate::config::AppConfig;
use crate::decision::{Prediction, RiskLabel, DECISION_THRESHOLD};
use crate::engine;
use crate::error::{ArtifactLoadError, FieldViolation, InvalidInputError, PipelineError};
use crate::form::{self, Outcome, PREDICTION_FAILED_MESSAGE};
use crate::metrics::{self, Metrics};

/// Loaded artifacts, shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    scaler: Arc<dyn Scaler>,
    classifier: Arc<dyn Classifier>,
}

impl AppState {
    pub fn new(scaler: Arc<dyn Scaler>, classifier: Arc<dyn Classifier>) -> Self {
        Self { scaler, classifier }
    }

    /// Load both artifacts named by `cfg`.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, ArtifactLoadError> {
        let (classifier, scaler) = load_artifacts(&cfg.model_path, &cfg.scaler_path)?;
        Ok(Self::new(Arc::new(scaler), Arc::new(classifier)))
    }

    /// Run the pipeline once and record its outcome.
    pub fn evaluate(&self, input: &ClinicalInput) -> Result<Prediction, PipelineError> {
        let started = Instant::now();
        let res = engine::evaluate(input, self.scaler.as_ref(), self.classifier.as_ref());
        match &res {
            Ok(p) => {
                metrics::record_prediction(p.label, started.elapsed().as_secs_f64() * 1000.0);
            }
            Err(PipelineError::InvalidInput(e)) => note_rejection(e),
            Err(PipelineError::Prediction(e)) => {
                metrics::record_prediction_error();
                error!(error = %e, "prediction failed");
            }
        }
        res
    }

    /// Check a submitted body field by field, then evaluate it.
    pub fn evaluate_submitted(
        &self,
        submitted: &SubmittedInput,
    ) -> Result<Prediction, PipelineError> {
        match submitted.validated() {
            Ok(input) => self.evaluate(&input),
            Err(e) => {
                note_rejection(&e);
                Err(e.into())
            }
        }
    }
}

fn note_rejection(e: &InvalidInputError) {
    metrics::record_invalid_input();
    let fields = e.violations.iter().map(|v| v.field).collect::<Vec<_>>();
    debug!(?fields, "input rejected");
}

/// A body that could not be read as a submission at all.
fn unreadable_body(message: String) -> InvalidInputError {
    let err = InvalidInputError {
        violations: vec![FieldViolation::new("body", message)],
    };
    note_rejection(&err);
    err
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/", get(form_page).post(form_submit))
        .route("/api/form", get(form_schema))
        .route("/api/predict", post(predict_json))
        .with_state(state);

    let api = match Metrics::init() {
        Ok(m) => api.merge(m.router()),
        Err(e) => {
            warn!(error = %e, "metrics recorder unavailable; /metrics disabled");
            api
        }
    };

    api.layer(CorsLayer::very_permissive())
}

/// Maps pipeline failures to HTTP. Prediction failures stay generic.
pub struct ApiError(pub PipelineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            PipelineError::InvalidInput(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "invalid_input",
                    "violations": e.violations,
                })),
            )
                .into_response(),
            PipelineError::Prediction(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "prediction_failed",
                    "message": PREDICTION_FAILED_MESSAGE,
                })),
            )
                .into_response(),
        }
    }
}

async fn form_page() -> Html<String> {
    Html(form::render_page(ClinicalInput::default().field_values(), None))
}

async fn form_submit(
    State(state): State<AppState>,
    submitted: Result<Form<SubmittedInput>, FormRejection>,
) -> (StatusCode, Html<String>) {
    let submitted = match submitted {
        Ok(Form(s)) => s,
        Err(rejection) => {
            let err = unreadable_body(rejection.body_text());
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(form::render_page(
                    ClinicalInput::default().field_values(),
                    Some(Outcome::Rejected(&err)),
                )),
            );
        }
    };
    let values = submitted.field_values();
    match state.evaluate_submitted(&submitted) {
        Ok(p) => (
            StatusCode::OK,
            Html(form::render_page(values, Some(Outcome::Predicted(p.label)))),
        ),
        Err(PipelineError::InvalidInput(e)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(form::render_page(values, Some(Outcome::Rejected(&e)))),
        ),
        Err(PipelineError::Prediction(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(form::render_page(values, Some(Outcome::Failed))),
        ),
    }
}

async fn form_schema() -> Json<serde_json::Value> {
    Json(json!({
        "fields": FORM_FIELDS,
        "threshold": DECISION_THRESHOLD,
        "labels": [RiskLabel::AtRisk.as_str(), RiskLabel::NotAtRisk.as_str()],
    }))
}

async fn predict_json(
    State(state): State<AppState>,
    submitted: Result<Json<SubmittedInput>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let Json(submitted) =
        submitted.map_err(|r| ApiError(unreadable_body(r.body_text()).into()))?;
    state
        .evaluate_submitted(&submitted)
        .map(Json)
        .map_err(ApiError)
}
