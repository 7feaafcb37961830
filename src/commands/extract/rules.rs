use anyhow::{Context, Result};
use regex::{Captures, Regex, RegexBuilder};

use crate::error::Diagnostic;
use crate::model::{MetricRecord, MetricSet};
use crate::profile::MetricRuleSet;

const RATIO_SEPARATOR: char = ':';

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pattern: Regex,
    min: f64,
    max: f64,
}

#[derive(Debug, Clone)]
pub struct CompiledRuleSet {
    pub metric_id: String,
    rules: Vec<CompiledRule>,
}

#[derive(Debug, Clone, Default)]
pub struct SectionExtraction {
    pub metrics: MetricSet,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn compile_rules(rule_sets: &[MetricRuleSet]) -> Result<Vec<CompiledRuleSet>> {
    rule_sets
        .iter()
        .map(|rule_set| {
            let rules = rule_set
                .rules
                .iter()
                .map(|rule| {
                    let pattern = RegexBuilder::new(&rule.pattern)
                        .case_insensitive(true)
                        .build()
                        .with_context(|| {
                            format!(
                                "failed to compile QnM pattern for {}: {}",
                                rule_set.metric_id, rule.pattern
                            )
                        })?;
                    Ok(CompiledRule {
                        pattern,
                        min: rule.min,
                        max: rule.max,
                    })
                })
                .collect::<Result<Vec<CompiledRule>>>()?;

            Ok(CompiledRuleSet {
                metric_id: rule_set.metric_id.clone(),
                rules,
            })
        })
        .collect()
}

/// Applies each metric's rules in declared order to one section.
///
/// The first rule whose match yields an in-range value wins. A match that is
/// out of range is reported and the next rule is tried.
pub fn extract(section_text: &str, rule_sets: &[CompiledRuleSet]) -> SectionExtraction {
    let mut extraction = SectionExtraction::default();

    for rule_set in rule_sets {
        for rule in &rule_set.rules {
            let Some(value) = rule
                .pattern
                .captures(section_text)
                .and_then(|captures| numeric_candidate(&captures))
                .and_then(parse_candidate)
            else {
                continue;
            };

            if value < rule.min || value > rule.max {
                extraction.diagnostics.push(Diagnostic::OutOfRangeValue {
                    metric_id: rule_set.metric_id.clone(),
                    value,
                    min: rule.min,
                    max: rule.max,
                });
                continue;
            }

            extraction.metrics.insert(MetricRecord {
                metric_id: rule_set.metric_id.clone(),
                value,
                valid_range: (rule.min, rule.max),
            });
            break;
        }
    }

    extraction
}

/// First capture group made only of digits, decimal points and ratio separators.
fn numeric_candidate<'t>(captures: &Captures<'t>) -> Option<&'t str> {
    captures
        .iter()
        .skip(1)
        .flatten()
        .map(|group| group.as_str())
        .find(|group| {
            group.chars().any(|ch| ch.is_ascii_digit())
                && group
                    .chars()
                    .all(|ch| ch.is_ascii_digit() || ch == '.' || ch == RATIO_SEPARATOR)
        })
}

/// Ratios collapse to their left operand: `20:1` reads as 20.
fn parse_candidate(candidate: &str) -> Option<f64> {
    let numeric = candidate
        .split(RATIO_SEPARATOR)
        .next()
        .unwrap_or(candidate);
    numeric.parse::<f64>().ok()
}
