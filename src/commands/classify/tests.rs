use std::fs;

use super::*;
use crate::profile::ScoringProfile;

fn section(name: &str, text: &str) -> Section {
    Section {
        name: name.to_string(),
        text: text.to_string(),
        order_index: 0,
    }
}

fn classifier() -> LexicalClassifier {
    LexicalClassifier::new().expect("keywords compile")
}

#[test]
fn research_text_is_labelled_research() {
    let prediction = classifier()
        .classify(&section(
            "CRITERION III : Research and Consultancy",
            "120 Scopus papers, 8 patents filed and 4 funded projects. The library was renovated.",
        ))
        .expect("classified");

    assert_eq!(prediction.predicted_criterion, "3. Research");
    // 4 research hits out of 5
    assert_eq!(prediction.confidence, 0.8);
}

#[test]
fn confidence_is_rounded_to_four_places() {
    let prediction = classifier()
        .classify(&section(
            "CRITERION IV : Infrastructure",
            "Hostel and library upgrades with research support.",
        ))
        .expect("classified");

    assert_eq!(prediction.predicted_criterion, "4. Infrastructure");
    assert_eq!(prediction.confidence, 0.6667);
}

#[test]
fn keywords_match_whole_words_only() {
    let prediction = classifier()
        .classify(&section("CRITERION I : Curricular Aspects", "The syllabus was revised."))
        .expect("classified");

    // "labs" inside "syllabus" must not count
    assert_eq!(prediction.predicted_criterion, "1. Curricular Aspects");
    assert_eq!(prediction.confidence, 1.0);
}

#[test]
fn section_without_keywords_falls_back_to_its_own_criterion() {
    let prediction = classifier()
        .classify(&section("CRITERION VI : Governance and Leadership", "Nothing to see."))
        .expect("classified");

    assert_eq!(prediction.predicted_criterion, "6. Governance");
    assert_eq!(prediction.confidence, 0.0);
}

#[test]
fn criterion_index_reads_roman_numerals() {
    let classifier = classifier();
    assert_eq!(classifier.criterion_index("CRITERION I  : Curricular Aspects"), Some(0));
    assert_eq!(classifier.criterion_index("Criterion vii : Best Practices"), Some(6));
    assert_eq!(classifier.criterion_index("CRITERION VIII : Unknown"), None);
    assert_eq!(classifier.criterion_index("Executive Summary"), None);
}

#[test]
fn only_criterion_sections_are_classified_in_order() {
    let document = SegmentedDocument {
        sections: vec![
            section("Executive Summary", "Research and teaching."),
            section("CRITERION II : Teaching", "Pedagogy and assessment."),
            section("criterion v : student support", "Placement and alumni."),
        ],
    };

    let predictions = classify_document(&document, &classifier()).expect("classified");

    assert_eq!(
        predictions.keys().collect::<Vec<&str>>(),
        vec!["CRITERION II : Teaching", "criterion v : student support"]
    );
    assert_eq!(
        predictions
            .get("criterion v : student support")
            .map(|prediction| prediction.predicted_criterion.as_str()),
        Some("5. Student Support")
    );
}

#[test]
fn run_writes_predictions_for_every_default_header() {
    let dir = tempfile::tempdir().expect("tempdir");
    let segmented_path = dir.path().join("segmented_ssr.json");
    let output_path = dir.path().join("qlm_predictions.json");

    let headers = ScoringProfile::default().criterion_headers;
    let document = SegmentedDocument {
        sections: headers
            .iter()
            .enumerate()
            .map(|(order_index, name)| Section {
                name: name.clone(),
                text: "Research papers and patents.".to_string(),
                order_index,
            })
            .collect(),
    };
    fs::write(
        &segmented_path,
        serde_json::to_vec(&document).expect("serialize segmented"),
    )
    .expect("write segmented");

    run(ClassifyArgs {
        segmented_path,
        output_path: output_path.clone(),
    })
    .expect("classify run");

    let predictions: QlmPredictions = read_json(&output_path).expect("read predictions");
    assert_eq!(predictions.len(), 7);
    assert!(
        predictions
            .values()
            .all(|prediction| prediction.predicted_criterion == "3. Research")
    );
}
