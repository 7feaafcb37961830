use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::ExtractArgs;
use crate::error::Diagnostic;
use crate::model::SegmentedDocument;
use crate::profile::load_profile;
use crate::util::{read_json, write_json_pretty};

mod aggregate;
mod rules;

pub use aggregate::{Aggregation, aggregate};
pub use rules::{CompiledRuleSet, SectionExtraction, compile_rules, extract};

pub fn run(args: ExtractArgs) -> Result<()> {
    let profile = load_profile(args.profile_path.as_deref())?;
    let rules = compile_rules(&profile.qnm_rules)?;
    let document: SegmentedDocument = read_json(&args.segmented_path)?;

    let aggregation = extract_document(&document, &rules);
    log_diagnostics(&aggregation.diagnostics);

    write_json_pretty(&args.output_path, &aggregation.metrics)?;
    info!(
        path = %args.output_path.display(),
        metrics = aggregation.metrics.len(),
        "wrote QnM metrics"
    );

    Ok(())
}

/// Extracts every section in document order and merges the results.
pub fn extract_document(document: &SegmentedDocument, rules: &[CompiledRuleSet]) -> Aggregation {
    let per_section = document
        .sections
        .iter()
        .map(|section| {
            let extraction = extract(&section.text, rules);
            debug!(
                section = %section.name,
                metrics = extraction.metrics.len(),
                "extracted section metrics"
            );
            (section.name.clone(), extraction)
        })
        .collect::<Vec<(String, SectionExtraction)>>();

    aggregate(&per_section)
}

pub fn log_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        warn!(detail = %diagnostic, "metric extraction");
    }
}
