//! # Artifact Loader
//!
//! Loads the two externally produced artifacts the decision engine depends on:
//!
//! - a fitted per-feature standardization (`scaler.json`)
//! - a trained feed-forward classifier (`heart_model.json`)
//!
//! Both are JSON exports of the training run. Loading either one failing is
//! fatal at startup; once loaded they are immutable and shared read-only.

use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::error::{ArtifactLoadError, PredictionError, Stage};
use crate::features::{FEATURE_COUNT, FEATURE_NAMES};

/// Fitted column transform applied before classification.
pub trait Scaler: Send + Sync {
    /// Number of columns the transform was fitted on.
    fn width(&self) -> usize;

    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PredictionError>;
}

/// Trained binary classifier producing one score per row.
pub trait Classifier: Send + Sync {
    fn input_width(&self) -> usize;

    fn predict(&self, row: &[f64]) -> Result<f64, PredictionError>;
}

/* ----------------------------
Scaler
---------------------------- */

#[derive(Debug, Deserialize)]
struct ScalerFile {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// `(x - mean) / scale`, per column.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build from fitted statistics. A zero `scale` marks a constant column
    /// and is replaced by 1.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        if mean.len() != scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            ));
        }
        if let Some(i) = mean.iter().position(|m| !m.is_finite()) {
            return Err(format!("mean[{i}] is not finite"));
        }
        if let Some(i) = scale.iter().position(|s| !s.is_finite() || *s < 0.0) {
            return Err(format!("scale[{i}] must be finite and non-negative"));
        }
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();
        Ok(Self { mean, scale })
    }

    /// Pass-through transform of the given width.
    pub fn identity(width: usize) -> Self {
        Self {
            mean: vec![0.0; width],
            scale: vec![1.0; width],
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        let bytes = read_artifact(path)?;
        let file: ScalerFile = parse_artifact(path, &bytes)?;

        if let Some(names) = &file.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_NAMES) {
                return Err(shape(
                    path,
                    format!("feature_names {names:?} do not match {FEATURE_NAMES:?}"),
                ));
            }
        }
        if file.mean.len() != FEATURE_COUNT {
            return Err(shape(
                path,
                format!("expected {FEATURE_COUNT} columns, got {}", file.mean.len()),
            ));
        }

        let scaler = Self::new(file.mean, file.scale).map_err(|reason| shape(path, reason))?;
        info!(
            path = %path.display(),
            sha256 = %fingerprint(&bytes),
            width = scaler.width(),
            "scaler loaded"
        );
        Ok(scaler)
    }
}

impl Scaler for StandardScaler {
    fn width(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if row.len() != self.width() {
            return Err(PredictionError::ShapeMismatch {
                stage: Stage::Transform,
                expected: self.width(),
                actual: row.len(),
            });
        }
        let out = row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect::<Vec<_>>();
        if out.iter().any(|v| !v.is_finite()) {
            return Err(PredictionError::NonFinite {
                stage: Stage::Transform,
            });
        }
        Ok(out)
    }
}

/* ----------------------------
Classifier
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::Relu => x.max(0.0),
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Self::Tanh => x.tanh(),
        }
    }
}

/// Fully connected layer. `kernel` is `inputs x units`, one row per input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DenseLayer {
    pub activation: Activation,
    pub kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl DenseLayer {
    pub fn new(activation: Activation, kernel: Vec<Vec<f64>>, bias: Vec<f64>) -> Self {
        Self {
            activation,
            kernel,
            bias,
        }
    }

    fn inputs(&self) -> usize {
        self.kernel.len()
    }

    fn units(&self) -> usize {
        self.bias.len()
    }

    fn forward(&self, x: &[f64]) -> Vec<f64> {
        (0..self.units())
            .map(|j| {
                let z = x
                    .iter()
                    .zip(&self.kernel)
                    .fold(self.bias[j], |acc, (xi, row)| acc + xi * row[j]);
                self.activation.apply(z)
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    input_dim: usize,
    layers: Vec<DenseLayer>,
}

/// Feed-forward network ending in a single output unit. A lone sigmoid
/// layer is a logistic regression.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseNetwork {
    input_dim: usize,
    layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    pub fn new(input_dim: usize, layers: Vec<DenseLayer>) -> Result<Self, String> {
        if layers.is_empty() {
            return Err("model has no layers".to_string());
        }
        let mut width = input_dim;
        for (idx, layer) in layers.iter().enumerate() {
            if layer.inputs() != width {
                return Err(format!(
                    "layer {idx} expects {} inputs, previous width is {width}",
                    layer.inputs()
                ));
            }
            if layer.units() == 0 {
                return Err(format!("layer {idx} has no units"));
            }
            if let Some(r) = layer.kernel.iter().position(|row| row.len() != layer.units()) {
                return Err(format!(
                    "layer {idx} kernel row {r} has {} entries, expected {}",
                    layer.kernel[r].len(),
                    layer.units()
                ));
            }
            let finite = layer.bias.iter().chain(layer.kernel.iter().flatten()).all(|w| w.is_finite());
            if !finite {
                return Err(format!("layer {idx} has non-finite weights"));
            }
            width = layer.units();
        }
        if width != 1 {
            return Err(format!("output layer has {width} units, expected 1"));
        }
        Ok(Self { input_dim, layers })
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        let bytes = read_artifact(path)?;
        let file: ModelFile = parse_artifact(path, &bytes)?;

        if file.input_dim != FEATURE_COUNT {
            return Err(shape(
                path,
                format!("input_dim is {}, expected {FEATURE_COUNT}", file.input_dim),
            ));
        }

        let model = Self::new(file.input_dim, file.layers).map_err(|reason| shape(path, reason))?;
        info!(
            path = %path.display(),
            sha256 = %fingerprint(&bytes),
            layers = model.layers.len(),
            "classifier loaded"
        );
        Ok(model)
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

impl Classifier for DenseNetwork {
    fn input_width(&self) -> usize {
        self.input_dim
    }

    fn predict(&self, row: &[f64]) -> Result<f64, PredictionError> {
        if row.len() != self.input_dim {
            return Err(PredictionError::ShapeMismatch {
                stage: Stage::Classify,
                expected: self.input_dim,
                actual: row.len(),
            });
        }
        let out = self
            .layers
            .iter()
            .fold(row.to_vec(), |x, layer| layer.forward(&x));
        match out.first() {
            Some(score) if score.is_finite() => Ok(*score),
            Some(_) => Err(PredictionError::NonFinite {
                stage: Stage::Classify,
            }),
            None => Err(PredictionError::Failed {
                stage: Stage::Classify,
                message: "network produced no output".to_string(),
            }),
        }
    }
}

/* ----------------------------
Loading
---------------------------- */

/// Load classifier and scaler. Either failing aborts startup.
pub fn load_artifacts<M, S>(
    model_path: M,
    scaler_path: S,
) -> Result<(DenseNetwork, StandardScaler), ArtifactLoadError>
where
    M: AsRef<Path>,
    S: AsRef<Path>,
{
    let classifier = DenseNetwork::from_json_file(model_path)?;
    let scaler = StandardScaler::from_json_file(scaler_path)?;
    Ok((classifier, scaler))
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ArtifactLoadError> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ArtifactLoadError::Missing {
            path: path.to_path_buf(),
        },
        _ => ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

fn parse_artifact<'a, T: Deserialize<'a>>(path: &Path, bytes: &'a [u8]) -> Result<T, ArtifactLoadError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactLoadError::Format {
        path: path.to_path_buf(),
        source,
    })
}

fn shape(path: &Path, reason: String) -> ArtifactLoadError {
    ArtifactLoadError::Shape {
        path: PathBuf::from(path),
        reason,
    }
}

/// Short SHA-256 digest for log lines.
fn fingerprint(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
