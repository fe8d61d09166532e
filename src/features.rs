//! # Feature Assembler
//! `ClinicalInput` → fixed-order 5-column `FeatureVector`.
//!
//! ST depression, ST slope and exercise angina are folded into a single
//! hand-weighted risk index and do not appear as columns of their own. The
//! classifier was fitted on this 5-column layout.

use serde::Serialize;

use crate::clinical::ClinicalInput;
use crate::error::InvalidInputError;

pub const FEATURE_COUNT: usize = 5;

/// Column names in the order the scaler and classifier were fitted with.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["cp", "thalach", "ca", "thal", "risk_index"];

const W_ST_DEPRESSION: f64 = 0.5;
const W_ST_SLOPE: f64 = -0.3;
const W_EXERCISE_ANGINA: f64 = -0.2;

/// Ordered model input: `[cp, thalach, ca, thal, risk_index]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn risk_index(&self) -> f64 {
        self.0[FEATURE_COUNT - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `0.5 * st_depression - 0.3 * st_slope - 0.2 * exercise_angina`, in f64.
pub fn risk_index(input: &ClinicalInput) -> f64 {
    input.st_depression * W_ST_DEPRESSION
        + f64::from(input.st_slope) * W_ST_SLOPE
        + f64::from(input.exercise_angina) * W_EXERCISE_ANGINA
}

/// Validate `input` and pack the feature vector.
pub fn assemble(input: &ClinicalInput) -> Result<FeatureVector, InvalidInputError> {
    input.validate()?;

    Ok(FeatureVector([
        f64::from(input.chest_pain_type),
        f64::from(input.max_heart_rate),
        f64::from(input.vessels_colored),
        f64::from(input.thalassemia_type),
        risk_index(input),
    ]))
}
