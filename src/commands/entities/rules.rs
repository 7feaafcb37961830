use anyhow::{Context, Result};
use regex::Regex;

use crate::model::Entity;

use super::EntityExtractor;

/// Labels in priority order. When two matches overlap the earlier label wins.
const ENTITY_PATTERNS: [(&str, &str); 5] = [
    ("METRIC_ID", r"\b\d+\.\d+\.\d+\b"),
    ("PERCENTAGE", r"\b\d+(?:\.\d+)?%"),
    (
        "PROGRAM",
        r"\b(?:[BM]\.?\s?[A-Z][A-Za-z]*|PhD)\s+in\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*",
    ),
    (
        "ORG",
        r"\b(?:[A-Z][A-Za-z&.'-]*\s+)+(?:College|University|Institute)(?:\s+of\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)?\b",
    ),
    ("YEAR", r"\b(?:19|20)\d{2}\b"),
];

pub struct RuleEntityExtractor {
    patterns: Vec<(&'static str, Regex)>,
}

impl RuleEntityExtractor {
    pub fn new() -> Result<Self> {
        let patterns = ENTITY_PATTERNS
            .iter()
            .map(|(label, pattern)| {
                Regex::new(pattern)
                    .map(|regex| (*label, regex))
                    .with_context(|| format!("failed to compile entity pattern for {label}"))
            })
            .collect::<Result<Vec<(&'static str, Regex)>>>()?;

        Ok(Self { patterns })
    }
}

impl EntityExtractor for RuleEntityExtractor {
    fn extract(&self, text: &str) -> Vec<Entity> {
        // byte spans of accepted matches
        let mut taken: Vec<(usize, usize, &str)> = Vec::new();

        for (label, pattern) in &self.patterns {
            for found in pattern.find_iter(text) {
                let overlaps = taken
                    .iter()
                    .any(|(start, end, _)| found.start() < *end && *start < found.end());
                if !overlaps {
                    taken.push((found.start(), found.end(), *label));
                }
            }
        }

        taken.sort_by_key(|(start, _, _)| *start);
        taken
            .into_iter()
            .map(|(start, end, label)| Entity {
                text: text[start..end].to_string(),
                label: label.to_string(),
                start: char_offset(text, start),
                end: char_offset(text, end),
            })
            .collect()
    }
}

/// Converts a byte offset on a char boundary to a character offset.
fn char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}
