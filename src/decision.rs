//! decision.rs — output shape of one prediction: score, binary label, and
//! the intermediate vectors the JSON API reports back.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::features::FeatureVector;

/// Score strictly above this is "at risk". Not configurable.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Binary risk verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLabel {
    AtRisk,
    NotAtRisk,
}

impl RiskLabel {
    /// `AtRisk` iff `score > 0.5`; exactly 0.5 is `NotAtRisk`.
    pub fn from_score(score: f64) -> Self {
        if score > DECISION_THRESHOLD {
            Self::AtRisk
        } else {
            Self::NotAtRisk
        }
    }

    /// The user-facing label string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtRisk => "At Risk of Heart Disease",
            Self::NotAtRisk => "Not At Risk",
        }
    }

    /// Short form for metric labels.
    pub fn metric_tag(&self) -> &'static str {
        match self {
            Self::AtRisk => "at_risk",
            Self::NotAtRisk => "not_at_risk",
        }
    }

    pub fn is_at_risk(&self) -> bool {
        matches!(self, Self::AtRisk)
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RiskLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Result of one pipeline run. Created per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: RiskLabel,
    pub at_risk: bool,
    /// Raw classifier output.
    pub score: f64,
    pub risk_index: f64,
    pub features: FeatureVector,
    pub scaled_features: Vec<f64>,
}

impl Prediction {
    pub fn new(features: FeatureVector, scaled_features: Vec<f64>, score: f64) -> Self {
        let label = RiskLabel::from_score(score);
        Self {
            label,
            at_risk: label.is_at_risk(),
            score,
            risk_index: features.risk_index(),
            features,
            scaled_features,
        }
    }
}
