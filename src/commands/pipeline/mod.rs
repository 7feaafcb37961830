use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::commands::{classify, entities, extract, pdf_text, score, segment, survey};
use crate::error::Diagnostic;
use crate::model::{
    CompositeResult, QlmPredictions, RawTextDocument, RunArtifactPaths, RunCounts,
    RunInputHashes, RunManifest,
};
use crate::profile::{ScoringProfile, load_profile};
use crate::util::{
    ensure_directory, now_utc_string, read_json, sha256_file, utc_compact_string,
    write_json_pretty,
};

pub mod ledger;
#[cfg(test)]
mod tests;

const MANIFEST_VERSION: u32 = 1;
const MANIFEST_FILE_NAME: &str = "run_manifest.json";

const STEP_LOAD_TEXT: &str = "load-text";
const STEP_SEGMENT: &str = "segment";
const STEP_EXTRACT: &str = "extract";
const STEP_CLASSIFY: &str = "classify";
const STEP_ENTITIES: &str = "entities";
const STEP_SURVEY: &str = "survey";
const STEP_SCORE: &str = "score";
const STEP_COMPLETE: &str = "complete";

pub fn run(args: RunArgs) -> Result<()> {
    let manifest = execute(&args)?;
    if let Some(result) = &manifest.result {
        score::log_result(result);
    }
    info!(
        run_id = %manifest.run_id,
        run_dir = %manifest.paths.run_dir,
        warnings = manifest.warnings.len(),
        "pipeline completed"
    );
    Ok(())
}

/// Runs every stage into `<cache_root>/runs/<run_id>/`. The manifest and the
/// ledger row are written whether the run completes or fails.
pub fn execute(args: &RunArgs) -> Result<RunManifest> {
    let mut inputs = vec![args.input_path.as_path(), args.survey_csv_path.as_path()];
    if let Some(qlm_path) = &args.qlm_path {
        inputs.push(qlm_path.as_path());
    }
    score::ensure_artifacts_exist(&inputs)?;

    let profile = load_profile(args.profile_path.as_deref())?;

    let (run_id, run_dir) = allocate_run_dir(&args.cache_root)?;
    let manifest_path = run_dir.join(MANIFEST_FILE_NAME);
    let ledger_path = args
        .ledger_path
        .clone()
        .unwrap_or_else(|| ledger::default_ledger_path(&args.cache_root));

    let started_at = now_utc_string();
    let mut manifest = RunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id: run_id.clone(),
        status: "running".to_string(),
        started_at: started_at.clone(),
        updated_at: started_at,
        completed_steps: Vec::new(),
        current_step: STEP_LOAD_TEXT.to_string(),
        failed_step: None,
        failure_reason: None,
        qlm_source: qlm_source(args.qlm_path.as_deref()),
        paths: artifact_paths(&run_dir),
        hashes: RunInputHashes {
            input_sha256: sha256_file(&args.input_path)?,
            survey_csv_sha256: sha256_file(&args.survey_csv_path)?,
            qlm_sha256: args.qlm_path.as_deref().map(sha256_file).transpose()?,
            profile_sha256: profile.content_hash()?,
        },
        counts: RunCounts::default(),
        result: None,
        warnings: Vec::new(),
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        run_id = %run_id,
        cache_root = %args.cache_root.display(),
        input = %args.input_path.display(),
        qlm_source = %manifest.qlm_source,
        "starting pipeline run"
    );

    let outcome = run_stages(args, &profile, &run_dir, &mut manifest);
    manifest.updated_at = now_utc_string();

    match &outcome {
        Ok(result) => {
            manifest.status = "completed".to_string();
            manifest.current_step = STEP_COMPLETE.to_string();
            manifest.result = Some(result.clone());
        }
        Err(err) => {
            manifest.status = "failed".to_string();
            manifest.failed_step = Some(manifest.current_step.clone());
            manifest.failure_reason = Some(format!("{err:#}"));
            error!(
                run_id = %run_id,
                step = %manifest.current_step,
                "pipeline run failed"
            );
        }
    }

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), status = %manifest.status, "wrote run manifest");

    let connection = ledger::open_ledger(&ledger_path)?;
    ledger::record_run(&connection, &manifest, &manifest_path)?;
    info!(path = %ledger_path.display(), run_id = %run_id, "recorded run in ledger");

    outcome.map(|_| manifest)
}

fn run_stages(
    args: &RunArgs,
    profile: &ScoringProfile,
    run_dir: &Path,
    manifest: &mut RunManifest,
) -> Result<CompositeResult> {
    let paths = artifact_paths(run_dir);
    let raw_text_path = PathBuf::from(&paths.raw_text_path);
    let segmented_path = PathBuf::from(&paths.segmented_path);
    let qnm_path = PathBuf::from(&paths.qnm_path);
    let qlm_path = PathBuf::from(&paths.qlm_path);
    let entities_path = PathBuf::from(&paths.entities_path);
    let sss_path = PathBuf::from(&paths.sss_path);
    let cgpa_path = PathBuf::from(&paths.cgpa_path);

    begin_step(manifest, STEP_LOAD_TEXT);
    let raw = if args.from_pdf {
        pdf_text::extract_raw_text(&args.input_path, None)?
    } else {
        read_json::<RawTextDocument>(&args.input_path)?
    };
    write_json_pretty(&raw_text_path, &raw)?;
    finish_step(manifest);

    begin_step(manifest, STEP_SEGMENT);
    let text = if args.keep_page_markers {
        raw.raw_text
    } else {
        segment::strip_page_markers(&raw.raw_text)?
    };
    let segmentation = segment::segment(&text, &profile.criterion_headers);
    segment::log_diagnostics(&segmentation.diagnostics);
    record_warnings(manifest, &segmentation.diagnostics);
    let headers = &profile.criterion_headers;
    if let Err(err) = segment::verify_segmentation(&segmentation.document, headers) {
        let debug_path = segmented_path.with_extension("debug.json");
        segment::write_debug_report(&debug_path, &segmentation, headers, &text)?;
        return Err(err.into());
    }
    let document = segmentation.document;
    write_json_pretty(&segmented_path, &document)?;
    manifest.counts.sections_found = document.len();
    finish_step(manifest);

    begin_step(manifest, STEP_EXTRACT);
    let rules = extract::compile_rules(&profile.qnm_rules)?;
    let aggregation = extract::extract_document(&document, &rules);
    extract::log_diagnostics(&aggregation.diagnostics);
    record_warnings(manifest, &aggregation.diagnostics);
    write_json_pretty(&qnm_path, &aggregation.metrics)?;
    manifest.counts.qnm_metrics_extracted = aggregation.metrics.len();
    finish_step(manifest);

    begin_step(manifest, STEP_CLASSIFY);
    let predictions = match &args.qlm_path {
        Some(external) => read_json::<QlmPredictions>(external)?,
        None => {
            let classifier = classify::LexicalClassifier::new()?;
            classify::classify_document(&document, &classifier)?
        }
    };
    write_json_pretty(&qlm_path, &predictions)?;
    manifest.counts.qlm_predictions = predictions.len();
    finish_step(manifest);

    begin_step(manifest, STEP_ENTITIES);
    let extractor = entities::RuleEntityExtractor::new()?;
    let found = entities::extract_document(&document, &extractor);
    write_json_pretty(&entities_path, &found)?;
    manifest.counts.entity_sections = found.len();
    finish_step(manifest);

    begin_step(manifest, STEP_SURVEY);
    let (report, survey_diagnostics) =
        survey::process_csv(&args.survey_csv_path, &profile.survey_categories)?;
    survey::log_diagnostics(&survey_diagnostics);
    record_warnings(manifest, &survey_diagnostics);
    write_json_pretty(&sss_path, &report)?;
    manifest.counts.survey_total_responses = report.metadata.total_responses;
    manifest.counts.survey_valid_responses = report.metadata.valid_responses;
    finish_step(manifest);

    begin_step(manifest, STEP_SCORE);
    let result = score::calculate(&qnm_path, &qlm_path, &sss_path, &profile.qnm_benchmarks)?;
    write_json_pretty(&cgpa_path, &result)?;
    manifest.counts.qnm_metrics_normalized = result.normalized_qnm.len();
    finish_step(manifest);

    Ok(result)
}

/// Run ids are second-resolution timestamps; a numeric suffix keeps runs
/// started within the same second apart. The run directory is claimed with
/// `create_dir`, so two runs never share one.
fn allocate_run_dir(cache_root: &Path) -> Result<(String, PathBuf)> {
    let runs_dir = cache_root.join("runs");
    ensure_directory(&runs_dir)?;
    let base = format!("run-{}", utc_compact_string(Utc::now()));

    let mut run_id = base.clone();
    let mut attempt = 1;
    loop {
        let run_dir = runs_dir.join(&run_id);
        match fs::create_dir(&run_dir) {
            Ok(()) => return Ok((run_id, run_dir)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                attempt += 1;
                run_id = format!("{base}-{attempt}");
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to create run directory {}", run_dir.display())
                });
            }
        }
    }
}

fn begin_step(manifest: &mut RunManifest, step: &str) {
    manifest.current_step = step.to_string();
    info!(run_id = %manifest.run_id, step, "step started");
}

fn finish_step(manifest: &mut RunManifest) {
    manifest.completed_steps.push(manifest.current_step.clone());
}

fn record_warnings(manifest: &mut RunManifest, diagnostics: &[Diagnostic]) {
    manifest
        .warnings
        .extend(diagnostics.iter().map(ToString::to_string));
}

fn qlm_source(qlm_path: Option<&Path>) -> String {
    match qlm_path {
        Some(path) => format!("external:{}", path.display()),
        None => "lexical".to_string(),
    }
}

fn artifact_paths(run_dir: &Path) -> RunArtifactPaths {
    let path = |name: &str| run_dir.join(name).display().to_string();
    RunArtifactPaths {
        run_dir: run_dir.display().to_string(),
        raw_text_path: path("raw_text.json"),
        segmented_path: path("segmented_ssr.json"),
        qnm_path: path("qnm_metrics.json"),
        qlm_path: path("qlm_predictions.json"),
        entities_path: path("ner_entities.json"),
        sss_path: path("naac_sss_report.json"),
        cgpa_path: path("cgpa_result.json"),
    }
}
