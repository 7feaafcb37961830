use std::collections::BTreeMap;

use crate::model::{CompositeResult, Grade, OrderedMap, QlmPrediction};
use crate::util::round2;

use super::SCALE_MAX;

const SGS_WEIGHT: f64 = 0.5;
const QLM_WEIGHT: f64 = 0.3;
const SSS_WEIGHT: f64 = 0.2;

/// Inclusive CGPA bands, highest first. Together they cover [0.00, 4.00] at
/// two-decimal resolution.
pub const GRADE_BANDS: [(Grade, f64, f64); 8] = [
    (Grade::APlusPlus, 3.51, 4.00),
    (Grade::APlus, 3.26, 3.50),
    (Grade::A, 3.01, 3.25),
    (Grade::BPlusPlus, 2.76, 3.00),
    (Grade::BPlus, 2.51, 2.75),
    (Grade::B, 2.01, 2.50),
    (Grade::C, 1.51, 2.00),
    (Grade::D, 0.00, 1.50),
];

pub fn grade_for(cgpa: f64) -> Grade {
    GRADE_BANDS
        .iter()
        .find(|(_, low, high)| *low <= cgpa && cgpa <= *high)
        .map(|(grade, _, _)| *grade)
        .unwrap_or(Grade::D)
}

pub fn grade_boundaries() -> OrderedMap<[f64; 2]> {
    GRADE_BANDS
        .iter()
        .map(|(grade, low, high)| (grade.as_str().to_string(), [*low, *high]))
        .collect()
}

/// Combines the three score families into the final CGPA and grade.
///
/// QlM confidences are taken as reported by the classifier.
pub fn score<'a>(
    normalized_qnm: BTreeMap<String, f64>,
    qlm_predictions: impl IntoIterator<Item = &'a QlmPrediction>,
    survey_weighted_score: f64,
) -> CompositeResult {
    let sgs = mean_or_zero(normalized_qnm.values().copied());
    let qlm = mean_or_zero(
        qlm_predictions
            .into_iter()
            .map(|prediction| prediction.confidence * SCALE_MAX),
    );
    let sss = survey_weighted_score.clamp(0.0, SCALE_MAX);

    let cgpa = round2(SGS_WEIGHT * sgs + QLM_WEIGHT * qlm + SSS_WEIGHT * sss);
    let grade = grade_for(cgpa);

    CompositeResult {
        sgs_score: round2(sgs),
        qlm_score: round2(qlm),
        sss_score: round2(sss),
        cgpa,
        grade,
        is_accredited: grade != Grade::D,
        normalized_qnm,
    }
}

fn mean_or_zero(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0_f64, 0usize), |(sum, count), value| {
        (sum + value, count + 1)
    });
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}
