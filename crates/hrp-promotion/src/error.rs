use hrp_registry::RegistryError;
use hrp_store::ErrorKind;
use thiserror::Error;

/// Anything that stops the gate from reaching a decision. Never swallowed:
/// an unscorable incumbent halts promotion instead of letting the candidate
/// through.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("EVALUATION_INVALID_SCORE: {which} score {value} is not finite")]
    NonFiniteScore { which: &'static str, value: f64 },

    #[error("EVALUATION_LENGTH_MISMATCH: {truth} labels vs {predicted} predictions")]
    LengthMismatch { truth: usize, predicted: usize },

    #[error("EVALUATION_HELD_OUT: {0}")]
    HeldOut(#[source] RegistryError),

    #[error("EVALUATION_PRODUCTION_MODEL: cannot score {artifact}: {source}")]
    ProductionModel {
        artifact: String,
        #[source]
        source: RegistryError,
    },
}

impl EvaluationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Evaluation
    }
}
