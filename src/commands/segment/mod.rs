use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::SegmentArgs;
use crate::error::{Diagnostic, PipelineError};
use crate::model::{RawTextDocument, Section, SegmentedDocument};
use crate::profile::{REQUIRED_CRITERIA, load_profile};
use crate::util::{read_json, write_json_pretty};

mod preprocess;
mod scanner;
#[cfg(test)]
mod tests;

pub use preprocess::strip_page_markers;
pub use scanner::{Segmentation, segment, verify_segmentation};

pub(crate) use scanner::roman_numeral;

pub fn run(args: SegmentArgs) -> Result<()> {
    let profile = load_profile(args.profile_path.as_deref())?;
    let document: RawTextDocument = read_json(&args.input_path)?;

    info!(
        path = %args.input_path.display(),
        chars = document.raw_text.chars().count(),
        "segmenting report text"
    );

    let text = if args.keep_page_markers {
        document.raw_text
    } else {
        strip_page_markers(&document.raw_text)?
    };

    let segmentation = segment(&text, &profile.criterion_headers);
    log_diagnostics(&segmentation.diagnostics);

    if let Err(err) = verify_segmentation(&segmentation.document, &profile.criterion_headers) {
        let debug_path = args.output_path.with_extension("debug.json");
        write_debug_report(&debug_path, &segmentation, &profile.criterion_headers, &text)?;
        return Err(err.into());
    }

    write_json_pretty(&args.output_path, &segmentation.document)?;
    info!(
        path = %args.output_path.display(),
        sections = segmentation.document.len(),
        "wrote segmented report"
    );

    Ok(())
}

pub fn log_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        warn!(detail = %diagnostic, "segmentation");
    }
}

/// Records what the segmenter saw so a failed verification can be diagnosed.
pub fn write_debug_report(
    path: &Path,
    segmentation: &Segmentation,
    headers: &[String],
    text: &str,
) -> Result<()> {
    write_json_pretty(path, &SegmentationDebug::new(segmentation, headers, text))?;
    warn!(path = %path.display(), "wrote segmentation debug report");
    Ok(())
}

/// Written next to the requested output when verification fails.
#[derive(Debug, Serialize)]
struct SegmentationDebug {
    required_headers: Vec<String>,
    found_headers: Vec<String>,
    missing_criteria: Vec<String>,
    diagnostics: Vec<String>,
    text_preview: String,
}

impl SegmentationDebug {
    fn new(segmentation: &Segmentation, headers: &[String], text: &str) -> Self {
        Self {
            required_headers: headers.to_vec(),
            found_headers: segmentation
                .document
                .sections
                .iter()
                .map(|section: &Section| section.name.clone())
                .collect(),
            missing_criteria: missing_criteria(&segmentation.document, headers),
            diagnostics: segmentation
                .diagnostics
                .iter()
                .map(ToString::to_string)
                .collect(),
            text_preview: text.chars().take(1000).collect(),
        }
    }
}

fn missing_criteria(document: &SegmentedDocument, headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .take(REQUIRED_CRITERIA)
        .enumerate()
        .filter(|(_, header)| !document.contains(header))
        .map(|(index, _)| roman_numeral(index + 1))
        .collect()
}

fn incomplete_segmentation(document: &SegmentedDocument, headers: &[String]) -> PipelineError {
    PipelineError::IncompleteSegmentation {
        found: document.len(),
        required: REQUIRED_CRITERIA,
        missing: missing_criteria(document, headers),
    }
}
