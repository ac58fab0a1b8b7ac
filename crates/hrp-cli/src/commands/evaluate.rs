use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hrp_promotion::{
    evaluate_candidate, production_digest, promote_if_accepted, write_evaluation_report_json,
    EvaluationReport, HeldOut,
};

use super::{read_local_table, RegistryContext};

pub struct EvaluateArgs<'a> {
    pub test_csv: &'a Path,
    pub candidate_score: f64,
    pub trained_model: &'a Path,
    pub promote: bool,
    pub delete_local: bool,
    pub report_dir: Option<PathBuf>,
}

/// Gate the candidate against production, optionally promote, always write
/// the evaluation report.
pub async fn run(ctx: &RegistryContext, args: EvaluateArgs<'_>) -> Result<()> {
    let table = read_local_table(args.test_csv)?;
    let held_out = HeldOut::from_table(&table, &ctx.settings.target_column)
        .with_context(|| format!("held-out data invalid: {}", args.test_csv.display()))?;

    let result = evaluate_candidate(&ctx.store, &ctx.production, args.candidate_score, &held_out)
        .await
        .context("evaluation aborted; production model left unchanged")?;

    let digest = production_digest(&ctx.store, &ctx.production).await;

    let mut report =
        EvaluationReport::new(ctx.production.clone(), args.trained_model, result, digest);

    if args.promote {
        report.promotion = promote_if_accepted(
            &result,
            &ctx.store,
            args.trained_model,
            &ctx.production,
            args.delete_local,
        )
        .await
        .with_context(|| format!("promote failed: {}", args.trained_model.display()))?;
    }

    let out_dir = args
        .report_dir
        .unwrap_or_else(|| ctx.settings.report_dir.clone());
    let report_path = write_evaluation_report_json(&out_dir, &report)
        .with_context(|| format!("write evaluation report failed: {}", out_dir.display()))?;

    println!("evaluation_id={}", report.evaluation_id);
    println!("model={}", report.model);
    println!("candidate_score={}", result.candidate_score);
    println!("production_score={}", result.production_score);
    println!("delta={}", result.delta);
    println!("accepted={}", result.accepted);
    println!("promoted={}", report.promotion.is_some());
    println!("report={}", report_path.display());
    Ok(())
}
