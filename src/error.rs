use std::path::PathBuf;

use thiserror::Error;

/// Conditions that abort a run. Each variant names the stage that failed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(
        "segmentation recovered {found}/{required} criteria; missing criteria: {}",
        .missing.join(", ")
    )]
    IncompleteSegmentation {
        found: usize,
        required: usize,
        missing: Vec<String>,
    },

    #[error(
        "survey stage found no valid responses in {} ({total} rows read; first rejection: {first_rejection})",
        .path.display()
    )]
    NoValidResponses {
        path: PathBuf,
        total: usize,
        first_rejection: String,
    },

    #[error("missing required input files: {}", display_paths(.paths))]
    MissingArtifact { paths: Vec<PathBuf> },

    #[error("external tool '{tool}' failed: {reason}")]
    ExternalTool { tool: String, reason: String },
}

/// Recoverable conditions. They are logged and recorded as warnings, never raised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    #[error("header not found: {header}")]
    MissingHeader { header: String },

    #[error("header '{header}' only appears before the current scan offset; section skipped")]
    OutOfOrderHeader { header: String },

    #[error("next header '{next}' not found after '{header}'; section runs to end of text")]
    UnterminatedSection { header: String, next: String },

    #[error("metric {metric_id}: value {value} outside expected range ({min}-{max})")]
    OutOfRangeValue {
        metric_id: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("survey row {row}: {reason}")]
    InvalidSurveyRow { row: usize, reason: String },

    #[error(
        "metric {metric_id}: value {ignored} from '{section}' ignored, keeping {kept} from '{first_section}'"
    )]
    MetricConflict {
        metric_id: String,
        kept: f64,
        ignored: f64,
        first_section: String,
        section: String,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_lists_every_path() {
        let err = PipelineError::MissingArtifact {
            paths: vec![PathBuf::from("a/qnm.json"), PathBuf::from("b/sss.json")],
        };
        assert_eq!(
            err.to_string(),
            "missing required input files: a/qnm.json, b/sss.json"
        );
    }

    #[test]
    fn incomplete_segmentation_names_missing_criteria() {
        let err = PipelineError::IncompleteSegmentation {
            found: 5,
            required: 7,
            missing: vec!["III".to_string(), "VII".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "segmentation recovered 5/7 criteria; missing criteria: III, VII"
        );
    }
}
