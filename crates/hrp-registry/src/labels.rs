//! The one mapping from raw outcome values to the binary label.
//!
//! | Raw value (case-insensitive, trimmed)  | Label      |
//! |----------------------------------------|------------|
//! | `positive`, `yes`, `true`, `1`, `1.0`  | `Positive` |
//! | `negative`, `no`, `false`, `0`, `0.0`  | `Negative` |
//!
//! Numeric cells are accepted when exactly 0 or 1. Anything else, including
//! a missing value, is an error: scoring never guesses a class.

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::table::{Cell, CellValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Label {
    Negative,
    Positive,
}

impl Label {
    pub fn as_u8(&self) -> u8 {
        match self {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Label::Positive)
    }

    /// Operator-facing rendering used by prediction output.
    pub fn response_str(&self) -> &'static str {
        match self {
            Label::Positive => "Response-Yes",
            Label::Negative => "Response-No",
        }
    }
}

impl From<Label> for u8 {
    fn from(l: Label) -> u8 {
        l.as_u8()
    }
}

impl TryFrom<u8> for Label {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Label::Negative),
            1 => Ok(Label::Positive),
            other => Err(format!("label must be 0 or 1, got {other}")),
        }
    }
}

pub fn encode_label_str(raw: &str) -> Result<Label, RegistryError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "positive" | "yes" | "true" | "1" | "1.0" => Ok(Label::Positive),
        "negative" | "no" | "false" | "0" | "0.0" => Ok(Label::Negative),
        _ => Err(RegistryError::Label {
            value: raw.to_string(),
        }),
    }
}

pub fn encode_label(cell: &Cell) -> Result<Label, RegistryError> {
    match cell {
        None => Err(RegistryError::Label {
            value: "<missing>".to_string(),
        }),
        Some(CellValue::Int(0)) => Ok(Label::Negative),
        Some(CellValue::Int(1)) => Ok(Label::Positive),
        Some(CellValue::Float(v)) if *v == 0.0 => Ok(Label::Negative),
        Some(CellValue::Float(v)) if *v == 1.0 => Ok(Label::Positive),
        Some(CellValue::Text(s)) => encode_label_str(s),
        Some(other) => Err(RegistryError::Label {
            value: other.to_string(),
        }),
    }
}

pub fn encode_labels(cells: &[Cell]) -> Result<Vec<Label>, RegistryError> {
    cells.iter().map(encode_label).collect()
}
