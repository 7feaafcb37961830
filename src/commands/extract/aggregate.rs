use std::collections::HashMap;

use crate::error::Diagnostic;
use crate::model::MetricSet;

use super::SectionExtraction;

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub metrics: MetricSet,
    pub diagnostics: Vec<Diagnostic>,
}

/// Merges per-section extractions in document order. The first section to
/// report a metric owns it; later values are dropped and, when they differ,
/// reported as conflicts.
pub fn aggregate(per_section: &[(String, SectionExtraction)]) -> Aggregation {
    let mut aggregation = Aggregation::default();
    // metric id -> section that supplied the kept value
    let mut seen = HashMap::<&str, &str>::new();

    for (section_name, extraction) in per_section {
        aggregation
            .diagnostics
            .extend(extraction.diagnostics.iter().cloned());

        for record in extraction.metrics.records() {
            if let Some(first_section) = seen.get(record.metric_id.as_str()) {
                let kept = aggregation
                    .metrics
                    .get(&record.metric_id)
                    .map(|kept| kept.value)
                    .unwrap_or_default();
                if kept != record.value {
                    aggregation.diagnostics.push(Diagnostic::MetricConflict {
                        metric_id: record.metric_id.clone(),
                        kept,
                        ignored: record.value,
                        first_section: first_section.to_string(),
                        section: section_name.clone(),
                    });
                }
                continue;
            }

            seen.insert(record.metric_id.as_str(), section_name.as_str());
            aggregation.metrics.insert(record.clone());
        }
    }

    aggregation
}
