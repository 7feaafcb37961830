use std::collections::BTreeMap;

use super::SCALE_MAX;

/// Rescales raw QnM values against their benchmarks onto [0, 4].
///
/// Metrics without a benchmark are dropped.
pub fn normalize(
    raw: &BTreeMap<String, f64>,
    benchmarks: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    raw.iter()
        .filter_map(|(metric_id, value)| {
            benchmarks
                .get(metric_id)
                .map(|benchmark| (metric_id.clone(), normalize_value(*value, *benchmark)))
        })
        .collect()
}

pub fn normalize_value(value: f64, benchmark: f64) -> f64 {
    (value / benchmark * SCALE_MAX).min(SCALE_MAX)
}
