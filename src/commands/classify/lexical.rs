use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::commands::segment::roman_numeral;
use crate::model::{QlmPrediction, Section};
use crate::util::round_to;

use super::{CRITERION_LABELS, SectionClassifier};

const CRITERION_KEYWORDS: [&[&str]; 7] = [
    &[
        "curriculum",
        "curricular",
        "syllabus",
        "elective",
        "electives",
        "board of studies",
        "course outcomes",
        "co-po",
        "obe",
        "academic flexibility",
        "value-added course",
        "nep-2020",
    ],
    &[
        "teaching",
        "pedagogy",
        "student-teacher ratio",
        "faculty development",
        "ict",
        "assessment",
        "evaluation",
        "mentoring",
        "flipped classrooms",
        "project-based learning",
    ],
    &[
        "research",
        "publications",
        "papers",
        "patents",
        "scopus",
        "h-index",
        "consultancy",
        "conferences",
        "funded",
        "phd",
    ],
    &[
        "infrastructure",
        "classrooms",
        "smart classrooms",
        "library",
        "laboratories",
        "labs",
        "hostel",
        "wifi",
        "e-journals",
        "campus facilities",
    ],
    &[
        "student support",
        "scholarships",
        "placement",
        "placements",
        "progression",
        "alumni",
        "grievance",
        "counselling",
        "sports",
        "higher studies",
    ],
    &[
        "governance",
        "leadership",
        "iqac",
        "strategic plan",
        "administration",
        "e-governance",
        "budget",
        "audit",
        "decentralization",
        "welfare measures",
    ],
    &[
        "best practices",
        "best practice",
        "innovation",
        "innovations",
        "green campus",
        "environment",
        "energy",
        "gender",
        "distinctiveness",
        "community",
    ],
];

/// Keyword-count classifier. Confidence is the share of keyword hits that
/// belong to the winning criterion.
pub struct LexicalClassifier {
    matchers: Vec<Regex>,
    criterion_header: Regex,
}

impl LexicalClassifier {
    pub fn new() -> Result<Self> {
        let matchers = CRITERION_KEYWORDS
            .iter()
            .zip(CRITERION_LABELS)
            .map(|(keywords, label)| {
                let alternation = keywords
                    .iter()
                    .map(|keyword| regex::escape(keyword))
                    .collect::<Vec<String>>()
                    .join("|");
                RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("failed to compile keywords for {label}"))
            })
            .collect::<Result<Vec<Regex>>>()?;

        let criterion_header = Regex::new(r"(?i)\bCRITERION\s+([IVX]+)\b")
            .context("failed to compile criterion header pattern")?;

        Ok(Self {
            matchers,
            criterion_header,
        })
    }

    /// Zero-based criterion index named by a `CRITERION <roman>` header.
    pub fn criterion_index(&self, name: &str) -> Option<usize> {
        let numeral = self
            .criterion_header
            .captures(name)?
            .get(1)?
            .as_str()
            .to_uppercase();

        (1..=CRITERION_LABELS.len())
            .find(|number| roman_numeral(*number) == numeral)
            .map(|number| number - 1)
    }

    fn hits(&self, text: &str) -> Vec<usize> {
        self.matchers
            .iter()
            .map(|matcher| matcher.find_iter(text).count())
            .collect()
    }
}

impl SectionClassifier for LexicalClassifier {
    fn classify(&self, section: &Section) -> Result<QlmPrediction> {
        let hits = self.hits(&section.text);
        let total = hits.iter().sum::<usize>();

        if total == 0 {
            let index = self.criterion_index(&section.name).unwrap_or(0);
            return Ok(QlmPrediction {
                predicted_criterion: CRITERION_LABELS[index].to_string(),
                confidence: 0.0,
            });
        }

        // ties go to the lower criterion
        let mut best = 0;
        for (index, count) in hits.iter().enumerate() {
            if *count > hits[best] {
                best = index;
            }
        }

        Ok(QlmPrediction {
            predicted_criterion: CRITERION_LABELS[best].to_string(),
            confidence: round_to(hits[best] as f64 / total as f64, 4),
        })
    }
}
