use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hrp_registry::{encode_labels, ArtifactRef, Label, TabularBatch};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EvaluationError;

pub const EVALUATION_REPORT_FILE: &str = "evaluation_report.json";

// ---------------------------------------------------------------------------
// Held-out data
// ---------------------------------------------------------------------------

/// Held-out features plus their encoded labels, row-aligned.
#[derive(Debug, Clone)]
pub struct HeldOut {
    pub features: TabularBatch,
    pub labels: Vec<Label>,
}

impl HeldOut {
    /// Split `target_column` off `table` and encode it with the shared label
    /// mapping. Unknown or missing labels are errors.
    pub fn from_table(table: &TabularBatch, target_column: &str) -> Result<Self, EvaluationError> {
        let (features, raw) = table
            .split_target(target_column)
            .map_err(EvaluationError::HeldOut)?;
        let labels = encode_labels(&raw).map_err(EvaluationError::HeldOut)?;
        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// One promotion decision. `delta = candidate_score - production_score`;
/// `accepted` only when the candidate is strictly better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub candidate_score: f64,
    pub production_score: f64,
    pub accepted: bool,
    pub delta: f64,
}

// ---------------------------------------------------------------------------
// Promotion receipt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionReceipt {
    pub model: ArtifactRef,
    /// sha256 hex of the uploaded bytes.
    pub model_digest: String,
    pub bytes: u64,
    /// True when this promotion created the parent folder marker.
    pub folder_created: bool,
    pub promoted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub evaluation_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    /// Production location the candidate was compared against.
    pub model: ArtifactRef,
    pub trained_model_path: String,
    pub result: EvaluationResult,
    /// sha256 of the incumbent, when one existed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_model_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionReceipt>,
}

impl EvaluationReport {
    pub fn new(
        model: ArtifactRef,
        trained_model_path: &Path,
        result: EvaluationResult,
        production_model_digest: Option<String>,
    ) -> Self {
        Self {
            evaluation_id: Uuid::new_v4(),
            evaluated_at: Utc::now(),
            model,
            trained_model_path: trained_model_path.display().to_string(),
            result,
            production_model_digest,
            promotion: None,
        }
    }
}

/// Write the report as pretty-printed JSON to
/// `out_dir/<evaluation_id>/evaluation_report.json`. Returns the path written.
pub fn write_evaluation_report_json(
    out_dir: &Path,
    report: &EvaluationReport,
) -> io::Result<PathBuf> {
    let dir = out_dir.join(report.evaluation_id.to_string());
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(EVALUATION_REPORT_FILE);
    let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_out_splits_and_encodes() {
        let table = TabularBatch::from_csv_bytes(
            b"Age,Troponin,Result\n63,0.01,negative\n21,1.06,positive\n",
        )
        .unwrap();
        let h = HeldOut::from_table(&table, "Result").unwrap();
        assert_eq!(h.labels, vec![Label::Negative, Label::Positive]);
        assert_eq!(h.features.column_names(), vec!["Age", "Troponin"]);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn held_out_rejects_unknown_label_and_missing_target() {
        let table = TabularBatch::from_csv_bytes(b"Age,Result\n63,maybe\n").unwrap();
        assert!(matches!(
            HeldOut::from_table(&table, "Result"),
            Err(EvaluationError::HeldOut(_))
        ));
        assert!(HeldOut::from_table(&table, "Outcome").is_err());
    }

    #[test]
    fn report_written_under_evaluation_id() {
        let dir = tempfile::tempdir().unwrap();
        let report = EvaluationReport::new(
            ArtifactRef::new("b", "model-registry/model.json"),
            Path::new("artifacts/model.json"),
            EvaluationResult {
                candidate_score: 0.8,
                production_score: 0.0,
                accepted: true,
                delta: 0.8,
            },
            None,
        );
        let path = write_evaluation_report_json(dir.path(), &report).unwrap();
        assert_eq!(
            path,
            dir.path()
                .join(report.evaluation_id.to_string())
                .join(EVALUATION_REPORT_FILE)
        );

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("production_model_digest"));
        let back: EvaluationReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, report);
    }
}
