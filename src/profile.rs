//! Scoring tables: criterion headers, QnM rules and benchmarks, survey weights.
//!
//! The built-in profile carries the NAAC 2023 tables. A JSON profile file may
//! override any of the four tables; omitted tables keep their defaults.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::util::{read_json, sha256_bytes};

pub const REQUIRED_CRITERIA: usize = 7;

const DEFAULT_HEADERS: [&str; REQUIRED_CRITERIA] = [
    "CRITERION I  : Curricular Aspects",
    "CRITERION II : Teaching, Learning and Evaluation",
    "CRITERION III : Research and Consultancy",
    "CRITERION IV : Infrastructure and Learning Resources",
    "CRITERION V  : Student Support and Progression",
    "CRITERION VI : Governance and Leadership",
    "CRITERION VII : Innovations and Best Practices",
];

// (metric id, [(pattern, min, max)])
const DEFAULT_QNM_RULES: [(&str, [(&str, f64, f64); 2]); 5] = [
    (
        "1.1.1",
        [
            (r"Faculty\D*student ratio\D*(\d+:\d+)", 5.0, 50.0),
            (r"Faculty\D*(\d+)\D*student\D*(\d+)", 5.0, 50.0),
        ],
    ),
    (
        "2.3.1",
        [
            (r"PhD faculty\D*(\d+)", 0.0, 200.0),
            (r"Doctoral faculty\D*(\d+)", 0.0, 200.0),
        ],
    ),
    (
        "3.2.1",
        [
            (r"Research papers\D*(\d+)", 0.0, 1000.0),
            (r"Publications\D*(\d+)", 0.0, 1000.0),
        ],
    ),
    (
        "4.1.1",
        [
            (r"Classrooms\D*(\d+)", 1.0, 100.0),
            (r"Lecture halls\D*(\d+)", 1.0, 50.0),
        ],
    ),
    (
        "5.2.1",
        [
            (r"Placement percentage\D*(\d+)%", 0.0, 100.0),
            (r"Students placed\D*(\d+)%", 0.0, 100.0),
        ],
    ),
];

const DEFAULT_BENCHMARKS: [(&str, f64); 3] = [
    ("3.2.1", 200.0), // research papers
    ("4.1.1", 40.0),  // classrooms
    ("5.2.1", 100.0), // placement %
];

// Survey processor weights. The synthetic generator's table (Student_Support_Services 0.10,
// no Overall_Institutional_Experience weight) is not used.
const DEFAULT_SURVEY_WEIGHTS: [(&str, f64); 15] = [
    ("Curriculum_Design_Relevance", 0.15),
    ("Teaching_Learning_Quality", 0.20),
    ("Assessment_Process_Fairness", 0.10),
    ("Infrastructure_Facilities", 0.08),
    ("Library_Resources_Access", 0.07),
    ("ICT_Resources_Availability", 0.07),
    ("Student_Support_Services", 0.08),
    ("Administrative_Efficiency", 0.07),
    ("Extracurricular_Activities", 0.05),
    ("Research_Innovation_Support", 0.08),
    ("Gender_Sensitivity_Initiatives", 0.04),
    ("Environmental_Sustainability", 0.03),
    ("Value_Added_Courses", 0.03),
    ("Grievance_Redressal_System", 0.03),
    ("Overall_Institutional_Experience", 0.10),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRule {
    pub pattern: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRuleSet {
    pub metric_id: String,
    pub rules: Vec<MetricRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyCategory {
    pub name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    #[serde(default = "default_criterion_headers")]
    pub criterion_headers: Vec<String>,
    #[serde(default = "default_qnm_rules")]
    pub qnm_rules: Vec<MetricRuleSet>,
    #[serde(default = "default_qnm_benchmarks")]
    pub qnm_benchmarks: BTreeMap<String, f64>,
    #[serde(default = "default_survey_categories")]
    pub survey_categories: Vec<SurveyCategory>,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self {
            criterion_headers: default_criterion_headers(),
            qnm_rules: default_qnm_rules(),
            qnm_benchmarks: default_qnm_benchmarks(),
            survey_categories: default_survey_categories(),
        }
    }
}

impl ScoringProfile {
    /// SHA-256 over the canonical JSON form, recorded in run manifests.
    pub fn content_hash(&self) -> Result<String> {
        let canonical = serde_json::to_vec(self)?;
        Ok(sha256_bytes(&canonical))
    }

    fn validate(&self) -> Result<()> {
        if self.criterion_headers.len() != REQUIRED_CRITERIA {
            bail!(
                "profile must define exactly {} criterion headers, found {}",
                REQUIRED_CRITERIA,
                self.criterion_headers.len()
            );
        }

        let mut seen_headers = HashSet::<&str>::new();
        for header in &self.criterion_headers {
            if header.trim().is_empty() {
                bail!("profile contains an empty criterion header");
            }
            if !seen_headers.insert(header.as_str()) {
                bail!("profile repeats criterion header: {header}");
            }
        }

        let mut seen_metrics = HashSet::<&str>::new();
        for rule_set in &self.qnm_rules {
            if !seen_metrics.insert(rule_set.metric_id.as_str()) {
                bail!("profile repeats QnM metric id: {}", rule_set.metric_id);
            }
            for rule in &rule_set.rules {
                if rule.min > rule.max {
                    bail!(
                        "QnM rule for {} has min {} above max {}",
                        rule_set.metric_id,
                        rule.min,
                        rule.max
                    );
                }
            }
        }

        for (metric_id, benchmark) in &self.qnm_benchmarks {
            if !benchmark.is_finite() || *benchmark <= 0.0 {
                bail!("benchmark for {metric_id} must be a positive number, found {benchmark}");
            }
        }

        if self.survey_categories.is_empty() {
            bail!("profile defines no survey categories");
        }
        let mut seen_categories = HashSet::<&str>::new();
        for category in &self.survey_categories {
            if !seen_categories.insert(category.name.as_str()) {
                bail!("profile repeats survey category: {}", category.name);
            }
        }

        Ok(())
    }
}

pub fn load_profile(path: Option<&Path>) -> Result<ScoringProfile> {
    let Some(path) = path else {
        return Ok(ScoringProfile::default());
    };

    let profile: ScoringProfile = read_json(path)?;
    profile.validate()?;
    info!(
        path = %path.display(),
        qnm_rules = profile.qnm_rules.len(),
        benchmarks = profile.qnm_benchmarks.len(),
        survey_categories = profile.survey_categories.len(),
        "loaded scoring profile"
    );
    Ok(profile)
}

fn default_criterion_headers() -> Vec<String> {
    DEFAULT_HEADERS.iter().map(|header| header.to_string()).collect()
}

fn default_qnm_rules() -> Vec<MetricRuleSet> {
    DEFAULT_QNM_RULES
        .iter()
        .map(|(metric_id, rules)| MetricRuleSet {
            metric_id: metric_id.to_string(),
            rules: rules
                .iter()
                .map(|(pattern, min, max)| MetricRule {
                    pattern: pattern.to_string(),
                    min: *min,
                    max: *max,
                })
                .collect(),
        })
        .collect()
}

fn default_qnm_benchmarks() -> BTreeMap<String, f64> {
    DEFAULT_BENCHMARKS
        .iter()
        .map(|(metric_id, benchmark)| (metric_id.to_string(), *benchmark))
        .collect()
}

fn default_survey_categories() -> Vec<SurveyCategory> {
    DEFAULT_SURVEY_WEIGHTS
        .iter()
        .map(|(name, weight)| SurveyCategory {
            name: name.to_string(),
            weight: *weight,
        })
        .collect()
}
