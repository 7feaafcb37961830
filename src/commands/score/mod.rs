use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::{info, warn};

use crate::cli::ScoreArgs;
use crate::error::PipelineError;
use crate::model::{CompositeResult, QlmPredictions};
use crate::profile::load_profile;
use crate::util::{read_json, write_json_pretty};

mod composite;
mod normalize;

pub use composite::{GRADE_BANDS, grade_boundaries, grade_for, score};
pub use normalize::{normalize, normalize_value};

pub const SCALE_MAX: f64 = 4.0;

/// The only part of a survey report the scorer reads.
#[derive(Debug, Deserialize)]
struct SurveyScoreArtifact {
    naac_scoring: SurveyScoreFields,
}

#[derive(Debug, Deserialize)]
struct SurveyScoreFields {
    weighted_score: f64,
}

pub fn run(args: ScoreArgs) -> Result<()> {
    let profile = load_profile(args.profile_path.as_deref())?;
    let result = calculate(
        &args.qnm_path,
        &args.qlm_path,
        &args.sss_path,
        &profile.qnm_benchmarks,
    )?;

    write_json_pretty(&args.output_path, &result)?;
    log_result(&result);
    info!(path = %args.output_path.display(), "wrote CGPA result");

    Ok(())
}

/// Fails with every missing path before reading any of them.
pub fn ensure_artifacts_exist(paths: &[&Path]) -> Result<(), PipelineError> {
    let missing = paths
        .iter()
        .filter(|path| !path.exists())
        .map(|path| path.to_path_buf())
        .collect::<Vec<PathBuf>>();

    if !missing.is_empty() {
        return Err(PipelineError::MissingArtifact { paths: missing });
    }
    Ok(())
}

pub fn calculate(
    qnm_path: &Path,
    qlm_path: &Path,
    sss_path: &Path,
    benchmarks: &BTreeMap<String, f64>,
) -> Result<CompositeResult> {
    ensure_artifacts_exist(&[qnm_path, qlm_path, sss_path])?;

    let raw_qnm: BTreeMap<String, f64> = read_json(qnm_path)?;
    let qlm: QlmPredictions = read_json(qlm_path)?;
    let survey: SurveyScoreArtifact = read_json(sss_path)?;

    let normalized = normalize(&raw_qnm, benchmarks);
    info!(
        raw = raw_qnm.len(),
        normalized = normalized.len(),
        predictions = qlm.len(),
        "scoring artifacts loaded"
    );
    if qlm.is_empty() {
        warn!(path = %qlm_path.display(), "no qlm predictions; qlm score is 0");
    }

    Ok(score(
        normalized,
        qlm.values(),
        survey.naac_scoring.weighted_score,
    ))
}

pub fn log_result(result: &CompositeResult) {
    info!(
        sgs_score = result.sgs_score,
        qlm_score = result.qlm_score,
        sss_score = result.sss_score,
        cgpa = result.cgpa,
        grade = %result.grade,
        is_accredited = result.is_accredited,
        "accreditation result"
    );
}
