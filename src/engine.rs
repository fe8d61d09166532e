//! # Decision Engine
//! Pure, testable logic that maps `FeatureVector` → `Prediction` given the
//! loaded scaler and classifier. No I/O.
//!
//! Policy: standardize the row, score it, label it "At Risk of Heart Disease"
//! when the score is strictly above 0.5. Failures are surfaced as errors and
//! never defaulted to either label.

use tracing::debug;

use crate::artifacts::{Classifier, Scaler};
use crate::clinical::ClinicalInput;
use crate::decision::Prediction;
use crate::error::{PipelineError, PredictionError, Stage};
use crate::features::{self, FeatureVector, FEATURE_COUNT};

/// Scale, classify and threshold one feature vector.
pub fn predict(
    vector: &FeatureVector,
    scaler: &dyn Scaler,
    classifier: &dyn Classifier,
) -> Result<Prediction, PredictionError> {
    // 1) Shape preconditions: the 5-column contract on every side
    check_width(Stage::Transform, vector.len())?;
    check_width(Stage::Transform, scaler.width())?;
    check_width(Stage::Classify, classifier.input_width())?;

    // 2) Scaler transform as a single row
    let scaled = scaler.transform(vector.as_slice())?;
    check_width(Stage::Classify, scaled.len())?;

    // 3) Classifier score
    let score = classifier.predict(&scaled)?;
    if !score.is_finite() {
        return Err(PredictionError::NonFinite {
            stage: Stage::Classify,
        });
    }

    // 4) Threshold
    let prediction = Prediction::new(*vector, scaled, score);
    debug!(score, label = %prediction.label, "prediction computed");
    Ok(prediction)
}

/// Full request pipeline: validate + assemble, then predict. Invalid input
/// never reaches the classifier.
pub fn evaluate(
    input: &ClinicalInput,
    scaler: &dyn Scaler,
    classifier: &dyn Classifier,
) -> Result<Prediction, PipelineError> {
    let vector = features::assemble(input)?;
    Ok(predict(&vector, scaler, classifier)?)
}

fn check_width(stage: Stage, actual: usize) -> Result<(), PredictionError> {
    if actual == FEATURE_COUNT {
        Ok(())
    } else {
        Err(PredictionError::ShapeMismatch {
            stage,
            expected: FEATURE_COUNT,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::StandardScaler;
    use crate::decision::RiskLabel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed score and counts calls.
    struct FixedScore {
        score: f64,
        calls: AtomicUsize,
    }

    impl FixedScore {
        fn new(score: f64) -> Self {
            Self {
                score,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Classifier for FixedScore {
        fn input_width(&self) -> usize {
            FEATURE_COUNT
        }
        fn predict(&self, _row: &[f64]) -> Result<f64, PredictionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.score)
        }
    }

    struct Narrow;

    impl Classifier for Narrow {
        fn input_width(&self) -> usize {
            4
        }
        fn predict(&self, _row: &[f64]) -> Result<f64, PredictionError> {
            Ok(0.9)
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn input_width(&self) -> usize {
            FEATURE_COUNT
        }
        fn predict(&self, _row: &[f64]) -> Result<f64, PredictionError> {
            Err(PredictionError::Failed {
                stage: Stage::Classify,
                message: "backend unavailable".to_string(),
            })
        }
    }

    fn vector() -> FeatureVector {
        features::assemble(&ClinicalInput::default()).unwrap()
    }

    #[test]
    fn labels_follow_strict_threshold() {
        let scaler = StandardScaler::identity(FEATURE_COUNT);
        for (score, label) in [
            (0.2, RiskLabel::NotAtRisk),
            (0.5, RiskLabel::NotAtRisk),
            (0.51, RiskLabel::AtRisk),
            (0.99, RiskLabel::AtRisk),
        ] {
            let p = predict(&vector(), &scaler, &FixedScore::new(score)).unwrap();
            assert_eq!(p.label, label, "score {score}");
            assert!((p.score - score).abs() < 1e-12);
        }
    }

    #[test]
    fn scaler_output_reaches_classifier_and_prediction() {
        let scaler =
            StandardScaler::new(vec![1.0, 150.0, 1.0, 2.0, 0.5], vec![1.0, 10.0, 1.0, 1.0, 1.0])
                .unwrap();
        let p = predict(&vector(), &scaler, &FixedScore::new(0.1)).unwrap();
        assert_eq!(p.scaled_features, vec![-1.0, 0.0, -1.0, -1.0, 0.0]);
        assert_eq!(p.features, vector());
    }

    #[test]
    fn width_mismatch_is_a_prediction_error() {
        let scaler = StandardScaler::identity(FEATURE_COUNT);
        let err = predict(&vector(), &scaler, &Narrow).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::ShapeMismatch {
                stage: Stage::Classify,
                expected: 5,
                actual: 4
            }
        ));

        let wide = StandardScaler::identity(6);
        let err = predict(&vector(), &wide, &FixedScore::new(0.9)).unwrap_err();
        assert!(matches!(err, PredictionError::ShapeMismatch { stage: Stage::Transform, .. }));
    }

    #[test]
    fn non_finite_score_is_rejected_not_labelled() {
        let scaler = StandardScaler::identity(FEATURE_COUNT);
        let err = predict(&vector(), &scaler, &FixedScore::new(f64::NAN)).unwrap_err();
        assert_eq!(
            err,
            PredictionError::NonFinite {
                stage: Stage::Classify
            }
        );
    }

    #[test]
    fn classifier_failure_propagates() {
        let scaler = StandardScaler::identity(FEATURE_COUNT);
        let err = predict(&vector(), &scaler, &Broken).unwrap_err();
        assert!(err.to_string().contains("backend unavailable"));
    }

    #[test]
    fn invalid_input_never_reaches_classifier() {
        let scaler = StandardScaler::identity(FEATURE_COUNT);
        let clf = FixedScore::new(0.9);
        let input = ClinicalInput {
            chest_pain_type: 4,
            ..ClinicalInput::default()
        };
        let err = evaluate(&input, &scaler, &clf).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(clf.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn evaluate_is_deterministic() {
        let scaler = StandardScaler::identity(FEATURE_COUNT);
        let clf = FixedScore::new(0.42);
        let a = evaluate(&ClinicalInput::default(), &scaler, &clf).unwrap();
        let b = evaluate(&ClinicalInput::default(), &scaler, &clf).unwrap();
        assert_eq!(a, b);
        assert_eq!(clf.calls.load(Ordering::SeqCst), 2);
    }
}
