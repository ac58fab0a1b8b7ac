//! Stored classifier encoding and the [`Model`] capability.
//!
//! A stored model is one JSON document tagged by `family`:
//!
//! ```json
//! {"family":"logistic","features":["Age","Troponin"],"weights":[0.04,9.1],"intercept":-3.2,"threshold":0.5}
//! {"family":"stump","feature":"Troponin","cutoff":0.014,"above":1,"below":0}
//! {"family":"constant","label":1}
//! ```
//!
//! The registry only ever calls [`Model::predict`]; the family adapters are
//! how a document becomes something that can predict.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::labels::Label;
use crate::table::TabularBatch;

pub trait Model: Send + Sync {
    fn family(&self) -> &'static str;

    /// One label per input row, in row order.
    fn predict(&self, rows: &TabularBatch) -> Result<Vec<Label>, RegistryError>;
}

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub features: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// Positive when `sigmoid(z) >= threshold`.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StumpModel {
    pub feature: String,
    pub cutoff: f64,
    /// Label for values strictly greater than `cutoff`.
    pub above: Label,
    pub below: Label,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantModel {
    pub label: Label,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelDocument {
    Logistic(LogisticModel),
    Stump(StumpModel),
    Constant(ConstantModel),
}

impl ModelDocument {
    pub fn constant(label: Label) -> Self {
        ModelDocument::Constant(ConstantModel { label })
    }

    pub fn family(&self) -> &'static str {
        match self {
            ModelDocument::Logistic(_) => "logistic",
            ModelDocument::Stump(_) => "stump",
            ModelDocument::Constant(_) => "constant",
        }
    }

    /// Structural checks serde cannot express.
    fn validate(&self) -> Result<(), String> {
        match self {
            ModelDocument::Logistic(m) => {
                if m.features.len() != m.weights.len() {
                    return Err(format!(
                        "logistic: {} features but {} weights",
                        m.features.len(),
                        m.weights.len()
                    ));
                }
                if !m.intercept.is_finite() || m.weights.iter().any(|w| !w.is_finite()) {
                    return Err("logistic: non-finite coefficient".to_string());
                }
                if !(0.0..=1.0).contains(&m.threshold) {
                    return Err(format!("logistic: threshold {} outside [0, 1]", m.threshold));
                }
                Ok(())
            }
            ModelDocument::Stump(m) if !m.cutoff.is_finite() => {
                Err("stump: non-finite cutoff".to_string())
            }
            _ => Ok(()),
        }
    }

    pub fn into_model(self) -> Arc<dyn Model> {
        match self {
            ModelDocument::Logistic(m) => Arc::new(m),
            ModelDocument::Stump(m) => Arc::new(m),
            ModelDocument::Constant(m) => Arc::new(m),
        }
    }
}

/// Parse and validate a stored model. `source_ref` only labels the error.
pub fn decode_model(bytes: &[u8], source_ref: &str) -> Result<Arc<dyn Model>, RegistryError> {
    let doc: ModelDocument =
        serde_json::from_slice(bytes).map_err(|e| RegistryError::Deserialization {
            source_ref: source_ref.to_string(),
            reason: e.to_string(),
        })?;
    doc.validate()
        .map_err(|reason| RegistryError::Deserialization {
            source_ref: source_ref.to_string(),
            reason,
        })?;
    Ok(doc.into_model())
}

pub fn encode_model(doc: &ModelDocument) -> Result<Vec<u8>, RegistryError> {
    serde_json::to_vec_pretty(doc).map_err(|e| RegistryError::Deserialization {
        source_ref: doc.family().to_string(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Family adapters
// ---------------------------------------------------------------------------

/// Numeric value of `feature` in every row. Nulls and text are errors.
fn numeric_column(rows: &TabularBatch, feature: &str) -> Result<Vec<f64>, RegistryError> {
    let idx = rows
        .column_index(feature)
        .ok_or_else(|| RegistryError::Predict(format!("missing feature column '{feature}'")))?;
    rows.rows()
        .iter()
        .enumerate()
        .map(|(r, row)| match &row[idx] {
            Some(v) => v.as_f64().ok_or_else(|| {
                RegistryError::Predict(format!("row {r} feature '{feature}' is not numeric"))
            }),
            None => Err(RegistryError::Predict(format!(
                "row {r} feature '{feature}' is missing"
            ))),
        })
        .collect()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Model for LogisticModel {
    fn family(&self) -> &'static str {
        "logistic"
    }

    fn predict(&self, rows: &TabularBatch) -> Result<Vec<Label>, RegistryError> {
        let mut z = vec![self.intercept; rows.n_rows()];
        for (feature, w) in self.features.iter().zip(&self.weights) {
            for (acc, x) in z.iter_mut().zip(numeric_column(rows, feature)?) {
                *acc += w * x;
            }
        }
        Ok(z
            .into_iter()
            .map(|z| {
                if sigmoid(z) >= self.threshold {
                    Label::Positive
                } else {
                    Label::Negative
                }
            })
            .collect())
    }
}

impl Model for StumpModel {
    fn family(&self) -> &'static str {
        "stump"
    }

    fn predict(&self, rows: &TabularBatch) -> Result<Vec<Label>, RegistryError> {
        Ok(numeric_column(rows, &self.feature)?
            .into_iter()
            .map(|x| if x > self.cutoff { self.above } else { self.below })
            .collect())
    }
}

impl Model for ConstantModel {
    fn family(&self) -> &'static str {
        "constant"
    }

    fn predict(&self, rows: &TabularBatch) -> Result<Vec<Label>, RegistryError> {
        Ok(vec![self.label; rows.n_rows()])
    }
}
