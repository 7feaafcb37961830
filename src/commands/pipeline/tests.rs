use std::collections::HashSet;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

use super::*;
use crate::error::PipelineError;
use crate::model::{Grade, QlmPrediction};

const BODIES: [&str; 7] = [
    "Syllabus revised in 2021.",
    "Faculty student ratio is 20:1.",
    "Research papers published: 200",
    "Classrooms: 20",
    "Placement percentage: 50%",
    "IQAC met 6 times.",
    "Green campus initiatives.",
];

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn cache_root(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    fn write_report(&self, headers: &[String]) -> PathBuf {
        let raw_text = headers
            .iter()
            .zip(BODIES)
            .map(|(header, body)| format!("{header}\n{body}\nPage 1 of 9\n"))
            .collect::<String>();
        let path = self.dir.path().join("ssr.json");
        write_json_pretty(&path, &RawTextDocument { raw_text }).expect("write report");
        path
    }

    fn write_survey(&self) -> PathBuf {
        let names = ScoringProfile::default()
            .survey_categories
            .iter()
            .map(|category| category.name.clone())
            .collect::<Vec<String>>();
        let mut csv = format!("Response_ID,{}\n", names.join(","));
        for (index, value) in ["3", "4", "2"].iter().enumerate() {
            csv.push_str(&format!("RESP_{:04},{}\n", index + 1, vec![*value; names.len()].join(",")));
        }
        let path = self.dir.path().join("sss.csv");
        fs::write(&path, csv).expect("write survey");
        path
    }

    fn args(&self, input_path: PathBuf, survey_csv_path: PathBuf) -> RunArgs {
        RunArgs {
            cache_root: self.cache_root(),
            input_path,
            from_pdf: false,
            survey_csv_path,
            qlm_path: None,
            profile_path: None,
            ledger_path: None,
            keep_page_markers: false,
        }
    }
}

#[test]
fn full_run_writes_artifacts_manifest_and_ledger_row() {
    let fixture = Fixture::new();
    let headers = ScoringProfile::default().criterion_headers;
    let args = fixture.args(fixture.write_report(&headers), fixture.write_survey());

    let manifest = execute(&args).expect("pipeline run");

    assert_eq!(manifest.status, "completed");
    assert_eq!(manifest.current_step, STEP_COMPLETE);
    assert_eq!(
        manifest.completed_steps,
        vec![
            STEP_LOAD_TEXT,
            STEP_SEGMENT,
            STEP_EXTRACT,
            STEP_CLASSIFY,
            STEP_ENTITIES,
            STEP_SURVEY,
            STEP_SCORE,
        ]
    );
    assert_eq!(manifest.qlm_source, "lexical");
    assert_eq!(manifest.counts.sections_found, 7);
    assert_eq!(manifest.counts.qnm_metrics_extracted, 4);
    assert_eq!(manifest.counts.qnm_metrics_normalized, 3);
    assert_eq!(manifest.counts.qlm_predictions, 7);
    assert_eq!(manifest.counts.entity_sections, 2);
    assert_eq!(manifest.counts.survey_valid_responses, 3);
    assert!(manifest.warnings.is_empty());

    let result = manifest.result.as_ref().expect("result recorded");
    assert_eq!(result.sgs_score, 2.67);
    // six sections at full confidence, one without keywords
    assert_eq!(result.qlm_score, 3.43);
    assert_eq!(result.sss_score, 3.54);
    assert_eq!(result.cgpa, 3.07);
    assert_eq!(result.grade, Grade::A);
    assert!(result.is_accredited);

    for path in [
        &manifest.paths.raw_text_path,
        &manifest.paths.segmented_path,
        &manifest.paths.qnm_path,
        &manifest.paths.qlm_path,
        &manifest.paths.entities_path,
        &manifest.paths.sss_path,
        &manifest.paths.cgpa_path,
    ] {
        assert!(Path::new(path).exists(), "missing artifact {path}");
    }

    let segmented: crate::model::SegmentedDocument =
        read_json(Path::new(&manifest.paths.segmented_path)).expect("read segmented");
    assert!(
        segmented
            .sections
            .iter()
            .all(|section| !section.text.contains("Page 1 of 9"))
    );

    let written: RunManifest =
        read_json(&Path::new(&manifest.paths.run_dir).join(MANIFEST_FILE_NAME))
            .expect("read manifest");
    assert_eq!(written.status, "completed");

    let connection =
        ledger::open_ledger(&ledger::default_ledger_path(&fixture.cache_root())).expect("ledger");
    let runs = ledger::recent_runs(&connection, 5).expect("recent runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, manifest.run_id);
    assert_eq!(runs[0].cgpa, Some(3.07));
    assert_eq!(runs[0].grade.as_deref(), Some("A"));
    assert_eq!(runs[0].is_accredited, Some(true));
}

#[test]
fn incomplete_segmentation_fails_the_run_and_is_recorded() {
    let fixture = Fixture::new();
    let mut headers = ScoringProfile::default().criterion_headers;
    headers[6] = "Closing remarks".to_string();
    let args = fixture.args(fixture.write_report(&headers), fixture.write_survey());

    let err = execute(&args).expect_err("segmentation must fail");
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::IncompleteSegmentation {
            found,
            required,
            missing,
        }) => {
            assert_eq!(*found, 6);
            assert_eq!(*required, 7);
            assert_eq!(missing, &vec!["VII".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let connection =
        ledger::open_ledger(&ledger::default_ledger_path(&fixture.cache_root())).expect("ledger");
    let runs = ledger::recent_runs(&connection, 5).expect("recent runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "failed");
    assert_eq!(runs[0].failed_step.as_deref(), Some(STEP_SEGMENT));
    assert_eq!(runs[0].cgpa, None);

    let manifest: RunManifest = read_json(Path::new(&runs[0].manifest_path)).expect("manifest");
    assert_eq!(manifest.completed_steps, vec![STEP_LOAD_TEXT]);
    assert!(
        manifest
            .failure_reason
            .as_deref()
            .is_some_and(|reason| reason.contains("missing criteria: VII"))
    );
    assert!(
        manifest
            .warnings
            .iter()
            .any(|warning| warning.contains("CRITERION VII"))
    );
    let debug_path = Path::new(&manifest.paths.segmented_path).with_extension("debug.json");
    assert!(debug_path.exists());
    assert!(!Path::new(&manifest.paths.qnm_path).exists());
}

#[test]
fn external_predictions_replace_the_lexical_classifier() {
    let fixture = Fixture::new();
    let headers = ScoringProfile::default().criterion_headers;
    let qlm_path = fixture.dir.path().join("external_qlm.json");
    let mut predictions = QlmPredictions::new();
    predictions.insert(
        headers[0].clone(),
        QlmPrediction {
            predicted_criterion: "1. Curricular Aspects".to_string(),
            confidence: 0.5,
        },
    );
    write_json_pretty(&qlm_path, &predictions).expect("write predictions");

    let mut args = fixture.args(fixture.write_report(&headers), fixture.write_survey());
    args.qlm_path = Some(qlm_path.clone());

    let manifest = execute(&args).expect("pipeline run");

    assert_eq!(manifest.qlm_source, format!("external:{}", qlm_path.display()));
    assert!(manifest.hashes.qlm_sha256.is_some());
    assert_eq!(manifest.counts.qlm_predictions, 1);
    assert_eq!(manifest.result.as_ref().map(|result| result.qlm_score), Some(2.0));
}

#[test]
fn missing_inputs_fail_before_a_run_directory_is_created() {
    let fixture = Fixture::new();
    let input_path = fixture.dir.path().join("absent.json");
    let survey_path = fixture.dir.path().join("absent.csv");
    let args = fixture.args(input_path.clone(), survey_path.clone());

    let err = execute(&args).expect_err("inputs missing");

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::MissingArtifact { paths }) => {
            assert_eq!(paths, &vec![input_path, survey_path]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!fixture.cache_root().join("runs").exists());
}

#[test]
fn run_dirs_started_in_the_same_second_get_suffixes() {
    let fixture = Fixture::new();

    let (first_id, first_dir) = allocate_run_dir(&fixture.cache_root()).expect("first");
    let (second_id, second_dir) = allocate_run_dir(&fixture.cache_root()).expect("second");

    assert!(first_id.starts_with("run-"));
    assert_ne!(first_id, second_id);
    assert_ne!(first_dir, second_dir);
    assert!(first_dir.exists() && second_dir.exists());
}

#[test]
fn concurrent_run_dir_allocation_never_shares_a_directory() {
    const WORKERS: usize = 8;

    for _ in 0..20 {
        let fixture = Fixture::new();
        let cache_root = fixture.cache_root();
        let barrier = Arc::new(Barrier::new(WORKERS));

        let handles = (0..WORKERS)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                let cache_root = cache_root.clone();
                thread::spawn(move || {
                    barrier.wait();
                    allocate_run_dir(&cache_root).expect("allocate run dir")
                })
            })
            .collect::<Vec<_>>();

        let allocated = handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread"))
            .collect::<Vec<(String, PathBuf)>>();

        let ids = allocated
            .iter()
            .map(|(run_id, _)| run_id.as_str())
            .collect::<HashSet<&str>>();
        assert_eq!(ids.len(), WORKERS, "duplicate run ids: {allocated:?}");
        assert!(allocated.iter().all(|(_, run_dir)| run_dir.is_dir()));
    }
}

#[test]
fn ledger_upserts_and_orders_runs() {
    let fixture = Fixture::new();
    let ledger_path = fixture.dir.path().join("ledger").join("runs.sqlite");
    let connection = ledger::open_ledger(&ledger_path).expect("open ledger");
    assert_eq!(
        ledger::schema_version(&connection).expect("schema version").as_deref(),
        Some("1")
    );

    let manifest_for = |run_id: &str, started_at: &str, status: &str| RunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id: run_id.to_string(),
        status: status.to_string(),
        started_at: started_at.to_string(),
        updated_at: started_at.to_string(),
        completed_steps: Vec::new(),
        current_step: STEP_LOAD_TEXT.to_string(),
        failed_step: None,
        failure_reason: None,
        qlm_source: "lexical".to_string(),
        paths: artifact_paths(fixture.dir.path()),
        hashes: RunInputHashes {
            input_sha256: "abc".to_string(),
            survey_csv_sha256: "def".to_string(),
            qlm_sha256: None,
            profile_sha256: "123".to_string(),
        },
        counts: RunCounts::default(),
        result: None,
        warnings: Vec::new(),
    };
    let manifest_path = fixture.dir.path().join(MANIFEST_FILE_NAME);

    ledger::record_run(
        &connection,
        &manifest_for("run-a", "2026-01-01T00:00:00Z", "running"),
        &manifest_path,
    )
    .expect("record a");
    ledger::record_run(
        &connection,
        &manifest_for("run-b", "2026-01-02T00:00:00Z", "completed"),
        &manifest_path,
    )
    .expect("record b");
    ledger::record_run(
        &connection,
        &manifest_for("run-a", "2026-01-01T00:00:00Z", "completed"),
        &manifest_path,
    )
    .expect("update a");

    let runs = ledger::recent_runs(&connection, 10).expect("recent runs");
    assert_eq!(
        runs.iter().map(|run| run.run_id.as_str()).collect::<Vec<&str>>(),
        vec!["run-b", "run-a"]
    );
    assert_eq!(runs[1].status, "completed");
    assert_eq!(ledger::recent_runs(&connection, 1).expect("limited").len(), 1);
}
