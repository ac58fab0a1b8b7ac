mod error;
mod evaluator;
mod metrics;
mod promote;
mod types;

pub use error::EvaluationError;
pub use evaluator::{decide, evaluate_candidate, production_digest};
pub use metrics::{f1_score, ConfusionCounts};
pub use promote::{promote, promote_if_accepted};
pub use types::{
    write_evaluation_report_json, EvaluationReport, EvaluationResult, HeldOut, PromotionReceipt,
    EVALUATION_REPORT_FILE,
};
