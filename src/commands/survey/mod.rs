use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::SurveyArgs;
use crate::commands::score::grade_boundaries;
use crate::error::{Diagnostic, PipelineError};
use crate::model::{CategoryStats, NaacScoring, OrderedMap, SurveyMetadata, SurveyReport};
use crate::profile::{SurveyCategory, load_profile};
use crate::util::{round_to, round2, write_json_pretty};

mod stats;

use stats::{mean, median, percentile, population_std_dev};

const SCORE_MIN: f64 = 0.0;
const SCORE_MAX: f64 = 4.0;
const INTERPRETATION: &str = "Scores calculated using NAAC 2023 weightings";

pub fn run(args: SurveyArgs) -> Result<()> {
    let profile = load_profile(args.profile_path.as_deref())?;
    let (report, diagnostics) = process_csv(&args.csv_path, &profile.survey_categories)?;
    log_diagnostics(&diagnostics);

    write_json_pretty(&args.output_path, &report)?;
    info!(
        path = %args.output_path.display(),
        valid_responses = report.metadata.valid_responses,
        weighted_score = report.naac_scoring.weighted_score,
        "wrote survey report"
    );

    Ok(())
}

pub fn log_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        warn!(detail = %diagnostic, "survey");
    }
}

/// Raw survey rows. Rows the CSV reader could not decode keep their error text.
#[derive(Debug, Clone, Default)]
pub struct SurveyTable {
    pub headers: Vec<String>,
    pub rows: Vec<std::result::Result<Vec<String>, String>>,
}

pub fn read_survey_csv(path: &Path) -> Result<SurveyTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open survey csv: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read survey header row: {}", path.display()))?
        .iter()
        .map(|header| header.trim().to_string())
        .collect::<Vec<String>>();

    let rows = reader
        .records()
        .map(|record| {
            record
                .map(|record| record.iter().map(ToOwned::to_owned).collect::<Vec<String>>())
                .map_err(|err| err.to_string())
        })
        .collect();

    Ok(SurveyTable { headers, rows })
}

pub fn process_csv(
    path: &Path,
    categories: &[SurveyCategory],
) -> Result<(SurveyReport, Vec<Diagnostic>)> {
    let table = read_survey_csv(path)?;
    info!(
        path = %path.display(),
        rows = table.rows.len(),
        columns = table.headers.len(),
        "loaded survey responses"
    );
    let processed = process(&table, categories).map_err(|rejected| {
        log_diagnostics(&rejected.diagnostics);
        PipelineError::NoValidResponses {
            path: path.to_path_buf(),
            total: table.rows.len(),
            first_rejection: rejected.first_rejection(),
        }
    })?;
    Ok(processed)
}

/// Every row was rejected. Holds one diagnostic per rejected row; the caller
/// attaches the source.
#[derive(Debug, Clone, PartialEq)]
pub struct NoValidRows {
    pub diagnostics: Vec<Diagnostic>,
}

impl NoValidRows {
    pub fn first_rejection(&self) -> String {
        self.diagnostics
            .first()
            .map(ToString::to_string)
            .unwrap_or_else(|| "no data rows".to_string())
    }
}

/// Validates each row and computes per-category statistics over valid rows.
pub fn process(
    table: &SurveyTable,
    categories: &[SurveyCategory],
) -> std::result::Result<(SurveyReport, Vec<Diagnostic>), NoValidRows> {
    let columns = categories
        .iter()
        .map(|category| table.headers.iter().position(|header| *header == category.name))
        .collect::<Vec<Option<usize>>>();

    let mut diagnostics = Vec::<Diagnostic>::new();
    let mut scores = vec![Vec::<f64>::new(); categories.len()];
    let mut valid_responses = 0usize;

    for (index, row) in table.rows.iter().enumerate() {
        let row_number = index + 1;
        let parsed = row
            .as_ref()
            .map_err(Clone::clone)
            .and_then(|fields| parse_row(fields, categories, &columns));

        match parsed {
            Ok(values) => {
                valid_responses += 1;
                for (category_scores, value) in scores.iter_mut().zip(values) {
                    category_scores.push(value);
                }
            }
            Err(reason) => diagnostics.push(Diagnostic::InvalidSurveyRow {
                row: row_number,
                reason,
            }),
        }
    }

    if valid_responses == 0 {
        return Err(NoValidRows { diagnostics });
    }

    let total_responses = table.rows.len();
    let mut category_analysis = OrderedMap::<CategoryStats>::new();
    for (category, values) in categories.iter().zip(&scores) {
        category_analysis.insert(
            category.name.clone(),
            CategoryStats {
                mean: round2(mean(values)),
                median: round2(median(values)),
                std_dev: round2(population_std_dev(values)),
                percentile_25: round2(percentile(values, 25.0)),
                percentile_75: round2(percentile(values, 75.0)),
                naac_weight: category.weight,
            },
        );
    }

    let weighted_sum = categories
        .iter()
        .filter_map(|category| {
            category_analysis
                .get(&category.name)
                .map(|stats| stats.mean * category.weight)
        })
        .sum::<f64>();

    let report = SurveyReport {
        metadata: SurveyMetadata {
            total_responses,
            valid_responses,
            validity_percentage: round_to(
                valid_responses as f64 / total_responses as f64 * 100.0,
                1,
            ),
        },
        category_analysis,
        naac_scoring: NaacScoring {
            weighted_score: round2(weighted_sum.clamp(SCORE_MIN, SCORE_MAX)),
            grade_boundaries: grade_boundaries(),
            interpretation: INTERPRETATION.to_string(),
        },
    };

    Ok((report, diagnostics))
}

fn parse_row(
    fields: &[String],
    categories: &[SurveyCategory],
    columns: &[Option<usize>],
) -> std::result::Result<Vec<f64>, String> {
    categories
        .iter()
        .zip(columns)
        .map(|(category, column)| {
            let Some(column) = column else {
                return Err(format!("missing column {}", category.name));
            };
            let raw = fields
                .get(*column)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| format!("missing value for {}", category.name))?;
            let value = raw
                .parse::<f64>()
                .map_err(|_| format!("non-numeric value '{raw}' for {}", category.name))?;
            if !(SCORE_MIN..=SCORE_MAX).contains(&value) {
                return Err(format!(
                    "value {raw} for {} outside [{SCORE_MIN}, {SCORE_MAX}]",
                    category.name
                ));
            }
            Ok(value)
        })
        .collect()
}
