use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::pipeline::ledger;
use crate::model::RunManifest;
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let ledger_path = args
        .ledger_path
        .clone()
        .unwrap_or_else(|| ledger::default_ledger_path(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if !ledger_path.exists() {
        warn!(path = %ledger_path.display(), "run ledger missing");
        return Ok(());
    }

    let connection = ledger::open_ledger(&ledger_path)?;
    let schema_version = ledger::schema_version(&connection)?.unwrap_or_default();
    let runs = ledger::recent_runs(&connection, args.limit)?;
    info!(
        path = %ledger_path.display(),
        schema_version = %schema_version,
        runs = runs.len(),
        "run ledger status"
    );

    for run in &runs {
        info!(
            run_id = %run.run_id,
            status = %run.status,
            started_at = %run.started_at,
            updated_at = %run.updated_at,
            failed_step = %run.failed_step.clone().unwrap_or_default(),
            sgs_score = run.sgs_score.unwrap_or_default(),
            qlm_score = run.qlm_score.unwrap_or_default(),
            sss_score = run.sss_score.unwrap_or_default(),
            cgpa = run.cgpa.unwrap_or_default(),
            grade = %run.grade.clone().unwrap_or_default(),
            is_accredited = run.is_accredited.unwrap_or_default(),
            input_sha256 = %run.input_sha256,
            "recorded run"
        );
    }

    if let Some(latest) = runs.first() {
        log_latest_manifest(Path::new(&latest.manifest_path))?;
    }

    Ok(())
}

fn log_latest_manifest(manifest_path: &Path) -> Result<()> {
    if !manifest_path.exists() {
        warn!(path = %manifest_path.display(), "run manifest missing");
        return Ok(());
    }

    let manifest: RunManifest = read_json(manifest_path)?;
    info!(
        run_id = %manifest.run_id,
        status = %manifest.status,
        current_step = %manifest.current_step,
        completed_steps = manifest.completed_steps.len(),
        failure_reason = %manifest.failure_reason.unwrap_or_default(),
        qlm_source = %manifest.qlm_source,
        sections_found = manifest.counts.sections_found,
        survey_valid_responses = manifest.counts.survey_valid_responses,
        warnings = manifest.warnings.len(),
        "loaded latest run manifest"
    );
    for warning in &manifest.warnings {
        warn!(run_id = %manifest.run_id, detail = %warning, "run warning");
    }

    Ok(())
}
