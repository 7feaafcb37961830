use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// JSON object whose keys keep insertion order on both read and write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends or replaces in place, keeping the existing position.
    pub fn insert(&mut self, key: String, value: V) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V> {
    marker: PhantomData<V>,
}

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor {
            marker: PhantomData,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTextDocument {
    pub raw_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub text: String,
    pub order_index: usize,
}

/// Segmenter output, serialized as `{header: text}` in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentedDocument {
    pub sections: Vec<Section>,
}

impl SegmentedDocument {
    pub fn contains(&self, name: &str) -> bool {
        self.sections.iter().any(|section| section.name == name)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }
}

impl Serialize for SegmentedDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for section in &self.sections {
            map.serialize_entry(&section.name, &section.text)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SegmentedDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = OrderedMap::<String>::deserialize(deserializer)?;
        let sections = map
            .iter()
            .enumerate()
            .map(|(order_index, (name, text))| Section {
                name: name.to_string(),
                text: text.clone(),
                order_index,
            })
            .collect();
        Ok(Self { sections })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub metric_id: String,
    pub value: f64,
    pub valid_range: (f64, f64),
}

/// Validated metrics keyed by metric id, serialized as `{metric_id: value}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricSet {
    records: BTreeMap<String, MetricRecord>,
}

impl MetricSet {
    pub fn get(&self, metric_id: &str) -> Option<&MetricRecord> {
        self.records.get(metric_id)
    }

    pub fn contains(&self, metric_id: &str) -> bool {
        self.records.contains_key(metric_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &MetricRecord> {
        self.records.values()
    }

    pub fn values(&self) -> BTreeMap<String, f64> {
        self.records
            .iter()
            .map(|(metric_id, record)| (metric_id.clone(), record.value))
            .collect()
    }

    /// Only called with records that already passed range validation.
    pub(crate) fn insert(&mut self, record: MetricRecord) {
        self.records.insert(record.metric_id.clone(), record);
    }
}

impl Serialize for MetricSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for (metric_id, record) in &self.records {
            map.serialize_entry(metric_id, &record.value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QlmPrediction {
    pub predicted_criterion: String,
    pub confidence: f64,
}

pub type QlmPredictions = OrderedMap<QlmPrediction>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyMetadata {
    pub total_responses: usize,
    pub valid_responses: usize,
    pub validity_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub percentile_25: f64,
    pub percentile_75: f64,
    pub naac_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaacScoring {
    pub weighted_score: f64,
    pub grade_boundaries: OrderedMap<[f64; 2]>,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyReport {
    pub metadata: SurveyMetadata,
    pub category_analysis: OrderedMap<CategoryStats>,
    pub naac_scoring: NaacScoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A++")]
    APlusPlus,
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B++")]
    BPlusPlus,
    #[serde(rename = "B+")]
    BPlus,
    B,
    C,
    D,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::APlusPlus => "A++",
            Self::APlus => "A+",
            Self::A => "A",
            Self::BPlusPlus => "B++",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub sgs_score: f64,
    pub qlm_score: f64,
    pub sss_score: f64,
    pub cgpa: f64,
    pub grade: Grade,
    pub is_accredited: bool,
    pub normalized_qnm: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunArtifactPaths {
    pub run_dir: String,
    pub raw_text_path: String,
    pub segmented_path: String,
    pub qnm_path: String,
    pub qlm_path: String,
    pub entities_path: String,
    pub sss_path: String,
    pub cgpa_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInputHashes {
    pub input_sha256: String,
    pub survey_csv_sha256: String,
    pub qlm_sha256: Option<String>,
    pub profile_sha256: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunCounts {
    pub sections_found: usize,
    pub qnm_metrics_extracted: usize,
    pub qnm_metrics_normalized: usize,
    pub qlm_predictions: usize,
    pub entity_sections: usize,
    pub survey_total_responses: usize,
    pub survey_valid_responses: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub completed_steps: Vec<String>,
    pub current_step: String,
    pub failed_step: Option<String>,
    pub failure_reason: Option<String>,
    pub qlm_source: String,
    pub paths: RunArtifactPaths,
    pub hashes: RunInputHashes,
    pub counts: RunCounts,
    pub result: Option<CompositeResult>,
    pub warnings: Vec<String>,
}
