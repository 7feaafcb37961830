use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::RunManifest;
use crate::util::{ensure_directory, now_utc_string};

const LEDGER_SCHEMA_VERSION: &str = "1";
const LEDGER_FILE_NAME: &str = "naac_runs.sqlite";

/// One row of the run ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRun {
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub failed_step: Option<String>,
    pub input_sha256: String,
    pub sgs_score: Option<f64>,
    pub qlm_score: Option<f64>,
    pub sss_score: Option<f64>,
    pub cgpa: Option<f64>,
    pub grade: Option<String>,
    pub is_accredited: Option<bool>,
    pub manifest_path: String,
}

pub fn default_ledger_path(cache_root: &Path) -> PathBuf {
    cache_root.join(LEDGER_FILE_NAME)
}

pub fn open_ledger(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    let connection =
        Connection::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS runs (
          run_id TEXT PRIMARY KEY,
          status TEXT NOT NULL,
          started_at TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          failed_step TEXT,
          input_sha256 TEXT NOT NULL,
          survey_csv_sha256 TEXT NOT NULL,
          profile_sha256 TEXT NOT NULL,
          sgs_score REAL,
          qlm_score REAL,
          sss_score REAL,
          cgpa REAL,
          grade TEXT,
          is_accredited INTEGER,
          manifest_path TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs(started_at);
        ",
    )?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('ledger_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [LEDGER_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Inserts or replaces the ledger row for a run.
pub fn record_run(
    connection: &Connection,
    manifest: &RunManifest,
    manifest_path: &Path,
) -> Result<()> {
    let result = manifest.result.as_ref();

    connection
        .execute(
            "
            INSERT INTO runs(
              run_id, status, started_at, updated_at, failed_step,
              input_sha256, survey_csv_sha256, profile_sha256,
              sgs_score, qlm_score, sss_score, cgpa, grade, is_accredited,
              manifest_path
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(run_id) DO UPDATE SET
              status=excluded.status,
              updated_at=excluded.updated_at,
              failed_step=excluded.failed_step,
              sgs_score=excluded.sgs_score,
              qlm_score=excluded.qlm_score,
              sss_score=excluded.sss_score,
              cgpa=excluded.cgpa,
              grade=excluded.grade,
              is_accredited=excluded.is_accredited
            ",
            params![
                manifest.run_id,
                manifest.status,
                manifest.started_at,
                manifest.updated_at,
                manifest.failed_step,
                manifest.hashes.input_sha256,
                manifest.hashes.survey_csv_sha256,
                manifest.hashes.profile_sha256,
                result.map(|value| value.sgs_score),
                result.map(|value| value.qlm_score),
                result.map(|value| value.sss_score),
                result.map(|value| value.cgpa),
                result.map(|value| value.grade.as_str()),
                result.map(|value| value.is_accredited),
                manifest_path.display().to_string(),
            ],
        )
        .with_context(|| format!("failed to record run {}", manifest.run_id))?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('ledger_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now_utc_string()],
    )?;

    Ok(())
}

/// Most recent runs first.
pub fn recent_runs(connection: &Connection, limit: usize) -> Result<Vec<LedgerRun>> {
    let mut statement = connection.prepare(
        "
        SELECT
          run_id, status, started_at, updated_at, failed_step, input_sha256,
          sgs_score, qlm_score, sss_score, cgpa, grade, is_accredited, manifest_path
        FROM runs
        ORDER BY started_at DESC, run_id DESC
        LIMIT ?1
        ",
    )?;

    let rows = statement.query_map([limit as i64], |row| {
        Ok(LedgerRun {
            run_id: row.get(0)?,
            status: row.get(1)?,
            started_at: row.get(2)?,
            updated_at: row.get(3)?,
            failed_step: row.get(4)?,
            input_sha256: row.get(5)?,
            sgs_score: row.get(6)?,
            qlm_score: row.get(7)?,
            sss_score: row.get(8)?,
            cgpa: row.get(9)?,
            grade: row.get(10)?,
            is_accredited: row.get(11)?,
            manifest_path: row.get(12)?,
        })
    })?;

    let mut runs = Vec::new();
    for row in rows {
        runs.push(row?);
    }
    Ok(runs)
}

pub fn schema_version(connection: &Connection) -> Result<Option<String>> {
    let version = connection
        .query_row(
            "SELECT value FROM metadata WHERE key = 'ledger_schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version)
}
