use hrp_registry::{ArtifactRef, ArtifactStore, ModelHandle};
use tracing::{info, warn};

use crate::error::EvaluationError;
use crate::metrics::f1_score;
use crate::types::{EvaluationResult, HeldOut};

// ============================================================================
// Decision rule
// ============================================================================

fn check_finite(which: &'static str, value: f64) -> Result<(), EvaluationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EvaluationError::NonFiniteScore { which, value })
    }
}

/// Strict comparison: a tie keeps the incumbent. Non-finite scores never
/// reach the comparison.
pub fn decide(
    candidate_score: f64,
    production_score: f64,
) -> Result<EvaluationResult, EvaluationError> {
    check_finite("candidate", candidate_score)?;
    check_finite("production", production_score)?;
    Ok(EvaluationResult {
        candidate_score,
        production_score,
        accepted: candidate_score > production_score,
        delta: candidate_score - production_score,
    })
}

// ============================================================================
// Gate
// ============================================================================

/// Score the candidate against whatever is stored at `production`.
///
/// - No stored model (or an existence check that failed): production
///   score is 0.
/// - Stored model present: it is loaded through a fresh [`ModelHandle`] and
///   scored on `held_out`; any load or predict failure aborts with
///   [`EvaluationError::ProductionModel`].
pub async fn evaluate_candidate(
    store: &ArtifactStore,
    production: &ArtifactRef,
    candidate_score: f64,
    held_out: &HeldOut,
) -> Result<EvaluationResult, EvaluationError> {
    check_finite("candidate", candidate_score)?;

    let handle = ModelHandle::new(store.clone(), production.clone());
    let production_score = if handle.is_present().await {
        let predicted = handle.predict(&held_out.features).await.map_err(|source| {
            EvaluationError::ProductionModel {
                artifact: production.to_string(),
                source,
            }
        })?;
        f1_score(&held_out.labels, &predicted)?
    } else {
        info!(artifact = %production, "no production model; scoring incumbent as 0");
        0.0
    };

    let result = decide(candidate_score, production_score)?;
    info!(
        artifact = %production,
        candidate_score = result.candidate_score,
        production_score = result.production_score,
        delta = result.delta,
        accepted = result.accepted,
        rows = held_out.len(),
        "evaluation complete"
    );
    Ok(result)
}

/// sha256 of the stored production model for the evaluation report. `None`
/// when nothing is stored; a failed lookup is logged and also yields `None`.
pub async fn production_digest(store: &ArtifactStore, production: &ArtifactRef) -> Option<String> {
    match store.has_model(production).await {
        Ok(true) => match store.model_digest(production).await {
            Ok(digest) => Some(digest),
            Err(e) => {
                warn!(
                    artifact = %production,
                    error = %e,
                    "production digest unavailable; omitted from report"
                );
                None
            }
        },
        Ok(false) => None,
        Err(e) => {
            warn!(
                artifact = %production,
                error = %e,
                "existence check failed; digest omitted from report"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_is_rejected() {
        for score in [0.0, 0.70, 0.75, 1.0] {
            let r = decide(score, score).unwrap();
            assert!(!r.accepted);
            assert_eq!(r.delta, 0.0);
        }
    }

    #[test]
    fn strictly_better_is_accepted_with_delta() {
        let r = decide(0.72, 0.65).unwrap();
        assert!(r.accepted);
        assert!((r.delta - 0.07).abs() < 1e-12);

        let r = decide(0.60, 0.65).unwrap();
        assert!(!r.accepted);
        assert!(r.delta < 0.0);
    }

    #[tokio::test]
    async fn production_digest_is_none_when_the_read_fails() {
        use std::sync::Arc;

        use hrp_store::{Connection, MemoryObjectStore, StoreOp};

        let mem = Arc::new(MemoryObjectStore::new());
        let store = ArtifactStore::new(Connection::new(mem.clone()));
        let production = ArtifactRef::new("b", "model-registry/model.json");
        assert_eq!(production_digest(&store, &production).await, None);

        mem.insert("b", "model-registry/model.json", b"{}".to_vec());
        assert_eq!(
            production_digest(&store, &production).await,
            Some(hrp_config::sha256_hex(b"{}"))
        );

        mem.fail_on(StoreOp::Get);
        assert_eq!(production_digest(&store, &production).await, None);
        mem.clear_faults();
        mem.fail_on(StoreOp::List);
        assert_eq!(production_digest(&store, &production).await, None);
    }

    #[test]
    fn non_finite_scores_fail_closed() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                decide(bad, 0.5),
                Err(EvaluationError::NonFiniteScore { which: "candidate", .. })
            ));
            assert!(matches!(
                decide(0.5, bad),
                Err(EvaluationError::NonFiniteScore { which: "production", .. })
            ));
        }
    }
}
