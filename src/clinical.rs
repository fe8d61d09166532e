//! # Clinical input
//! The seven measurements collected by the form, their declared domains, and
//! the static catalogue the presentation layer renders widgets from.
//!
//! Categorical codes map to display labels through lookup tables rather than
//! per-field formatting closures; validation is driven by the same catalogue
//! so the widget bounds and the accepted domain cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::error::{FieldViolation, InvalidInputError};

/// One selectable option of a categorical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub code: i32,
    pub label: &'static str,
}

const fn choice(code: i32, label: &'static str) -> Choice {
    Choice { code, label }
}

pub const CHEST_PAIN_TYPES: &[Choice] = &[
    choice(0, "Typical angina"),
    choice(1, "Atypical angina"),
    choice(2, "Non-anginal pain"),
    choice(3, "Asymptomatic"),
];

pub const VESSEL_COUNTS: &[Choice] = &[
    choice(0, "0"),
    choice(1, "1"),
    choice(2, "2"),
    choice(3, "3"),
];

pub const THALASSEMIA_TYPES: &[Choice] = &[
    choice(1, "Fixed defect"),
    choice(2, "Reversible defect"),
    choice(3, "Normal"),
];

pub const ST_SLOPES: &[Choice] = &[
    choice(0, "Upsloping"),
    choice(1, "Flat"),
    choice(2, "Downsloping"),
];

pub const EXERCISE_ANGINA: &[Choice] = &[choice(0, "No"), choice(1, "Yes")];

/// Display label for `code` in `table`.
pub fn label_for(table: &[Choice], code: i32) -> Option<&'static str> {
    table.iter().find(|c| c.code == code).map(|c| c.label)
}

/// Widget kind together with the domain it enforces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Widget {
    Select { options: &'static [Choice] },
    Slider { min: f64, max: f64, step: f64 },
}

impl Widget {
    /// Check `value` against the widget's domain.
    pub fn check(&self, value: f64) -> Result<(), String> {
        if !value.is_finite() {
            return Err(format!("{value} is not a finite number"));
        }
        match *self {
            Self::Select { options } => {
                let hit = options.iter().any(|c| f64::from(c.code) == value);
                if hit {
                    Ok(())
                } else {
                    let codes = options
                        .iter()
                        .map(|c| c.code.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    Err(format!("{value} not in {{{codes}}}"))
                }
            }
            Self::Slider { min, max, step } => {
                if !(min..=max).contains(&value) {
                    return Err(format!("{value} out of range [{min}, {max}]"));
                }
                let steps = (value - min) / step;
                if (steps - steps.round()).abs() > 1e-6 {
                    return Err(format!("{value} is not a multiple of {step}"));
                }
                Ok(())
            }
        }
    }
}

/// Static description of one form field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub help: &'static str,
    pub widget: Widget,
    pub default: f64,
}

/// Form fields in display order (same order as `ClinicalInput`).
pub const FORM_FIELDS: [FieldSpec; 7] = [
    FieldSpec {
        name: "chest_pain_type",
        label: "Chest Pain Type",
        help: "0: Typical angina, 1: Atypical angina, 2: Non-anginal pain, 3: Asymptomatic",
        widget: Widget::Select {
            options: CHEST_PAIN_TYPES,
        },
        default: 0.0,
    },
    FieldSpec {
        name: "max_heart_rate",
        label: "Maximum Heart Rate Achieved (thalach)",
        help: "Measured in beats per minute (bpm)",
        widget: Widget::Slider {
            min: 70.0,
            max: 210.0,
            step: 1.0,
        },
        default: 150.0,
    },
    FieldSpec {
        name: "vessels_colored",
        label: "Number of Major Vessels Colored by Fluoroscopy (ca)",
        help: "Ranges from 0 to 3; more vessels may indicate worse heart condition",
        widget: Widget::Select {
            options: VESSEL_COUNTS,
        },
        default: 0.0,
    },
    FieldSpec {
        name: "thalassemia_type",
        label: "Thalassemia Type",
        help: "1: Fixed, 2: Reversible, 3: Normal",
        widget: Widget::Select {
            options: THALASSEMIA_TYPES,
        },
        default: 1.0,
    },
    FieldSpec {
        name: "st_depression",
        label: "ST Depression Induced by Exercise (oldpeak)",
        help: "ST depression compared to rest; higher values may indicate risk",
        widget: Widget::Slider {
            min: 0.0,
            max: 6.0,
            step: 0.1,
        },
        default: 1.0,
    },
    FieldSpec {
        name: "st_slope",
        label: "Slope of Peak Exercise ST Segment",
        help: "0: Upsloping, 1: Flat, 2: Downsloping",
        widget: Widget::Select { options: ST_SLOPES },
        default: 0.0,
    },
    FieldSpec {
        name: "exercise_angina",
        label: "Exercise Induced Angina (exang)",
        help: "1 = Yes, 0 = No; presence of chest pain during exercise",
        widget: Widget::Select {
            options: EXERCISE_ANGINA,
        },
        default: 0.0,
    },
];

/// Raw measurements for one prediction request.
///
/// Aliases accept the short column names the model was fitted with
/// (`cp`, `thalach`, `ca`, `thal`, `oldpeak`, `slope`, `exang`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalInput {
    #[serde(alias = "cp")]
    pub chest_pain_type: i32,
    #[serde(alias = "thalach")]
    pub max_heart_rate: i32,
    #[serde(alias = "ca")]
    pub vessels_colored: i32,
    #[serde(alias = "thal")]
    pub thalassemia_type: i32,
    #[serde(alias = "oldpeak")]
    pub st_depression: f64,
    #[serde(alias = "slope")]
    pub st_slope: i32,
    #[serde(alias = "exang")]
    pub exercise_angina: i32,
}

impl Default for ClinicalInput {
    /// Widget defaults of the form.
    fn default() -> Self {
        Self {
            chest_pain_type: 0,
            max_heart_rate: 150,
            vessels_colored: 0,
            thalassemia_type: 1,
            st_depression: 1.0,
            st_slope: 0,
            exercise_angina: 0,
        }
    }
}

impl ClinicalInput {
    /// Field values in `FORM_FIELDS` order.
    pub fn field_values(&self) -> [f64; 7] {
        [
            f64::from(self.chest_pain_type),
            f64::from(self.max_heart_rate),
            f64::from(self.vessels_colored),
            f64::from(self.thalassemia_type),
            self.st_depression,
            f64::from(self.st_slope),
            f64::from(self.exercise_angina),
        ]
    }

    /// Reject any field outside its declared domain. Values are never clamped.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        let violations = FORM_FIELDS
            .iter()
            .zip(self.field_values())
            .filter_map(|(spec, value)| {
                spec.widget
                    .check(value)
                    .err()
                    .map(|msg| FieldViolation::new(spec.name, msg))
            })
            .collect::<Vec<_>>();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(InvalidInputError { violations })
        }
    }
}

/// One value as it arrived on the wire. Form bodies always carry text;
/// JSON bodies usually carry numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    fn to_number(&self) -> Result<f64, String> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("{s:?} is not a number")),
        }
    }
}

/// A submitted form or JSON body before domain checks.
///
/// Every field is optional and loosely typed so that a missing field, a
/// fractional code or an integer past `i32` surfaces as a field violation
/// instead of a body rejection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubmittedInput {
    #[serde(alias = "cp")]
    pub chest_pain_type: Option<FieldValue>,
    #[serde(alias = "thalach")]
    pub max_heart_rate: Option<FieldValue>,
    #[serde(alias = "ca")]
    pub vessels_colored: Option<FieldValue>,
    #[serde(alias = "thal")]
    pub thalassemia_type: Option<FieldValue>,
    #[serde(alias = "oldpeak")]
    pub st_depression: Option<FieldValue>,
    #[serde(alias = "slope")]
    pub st_slope: Option<FieldValue>,
    #[serde(alias = "exang")]
    pub exercise_angina: Option<FieldValue>,
}

impl SubmittedInput {
    fn fields(&self) -> [Option<&FieldValue>; 7] {
        [
            self.chest_pain_type.as_ref(),
            self.max_heart_rate.as_ref(),
            self.vessels_colored.as_ref(),
            self.thalassemia_type.as_ref(),
            self.st_depression.as_ref(),
            self.st_slope.as_ref(),
            self.exercise_angina.as_ref(),
        ]
    }

    /// Values to re-render the form with, in `FORM_FIELDS` order. Entries
    /// that are absent or not numeric fall back to the widget default.
    pub fn field_values(&self) -> [f64; 7] {
        let mut values = FORM_FIELDS.map(|f| f.default);
        for (slot, submitted) in values.iter_mut().zip(self.fields()) {
            if let Some(Ok(n)) = submitted.map(FieldValue::to_number) {
                *slot = n;
            }
        }
        values
    }

    /// Check every field against its widget domain and build the typed input.
    pub fn validated(&self) -> Result<ClinicalInput, InvalidInputError> {
        let mut values = [0.0; 7];
        let mut violations = Vec::new();
        for ((spec, slot), submitted) in FORM_FIELDS
            .iter()
            .zip(values.iter_mut())
            .zip(self.fields())
        {
            let checked = match submitted {
                None => Err("missing value".to_string()),
                Some(v) => v
                    .to_number()
                    .and_then(|n| spec.widget.check(n).map(|()| n)),
            };
            match checked {
                Ok(n) => *slot = n,
                Err(msg) => violations.push(FieldViolation::new(spec.name, msg)),
            }
        }
        if !violations.is_empty() {
            return Err(InvalidInputError { violations });
        }

        // every integer field is now a small whole number
        let [cp, thalach, ca, thal, oldpeak, slope, exang] = values;
        let whole = |v: f64| v.round() as i32;
        Ok(ClinicalInput {
            chest_pain_type: whole(cp),
            max_heart_rate: whole(thalach),
            vessels_colored: whole(ca),
            thalassemia_type: whole(thal),
            st_depression: oldpeak,
            st_slope: whole(slope),
            exercise_angina: whole(exang),
        })
    }
}
