use std::fs;

use super::*;
use crate::cli::SegmentArgs;
use crate::profile::ScoringProfile;

fn headers() -> Vec<String> {
    ScoringProfile::default().criterion_headers
}

fn report_with_bodies(headers: &[String], bodies: &[&str]) -> String {
    headers
        .iter()
        .zip(bodies)
        .map(|(header, body)| format!("{header}\n{body}\n"))
        .collect::<String>()
}

const BODIES: [&str; 7] = [
    "Syllabus revised in 2021.",
    "Faculty student ratio is 20:1.",
    "Research papers published: 200",
    "Classrooms: 20",
    "Placement percentage: 50%",
    "IQAC met 6 times.",
    "Green campus initiatives.",
];

#[test]
fn segment_recovers_all_sections_in_order() {
    let headers = headers();
    let text = format!("Preamble text\n{}", report_with_bodies(&headers, &BODIES));

    let segmentation = segment(&text, &headers);

    assert!(segmentation.diagnostics.is_empty());
    assert_eq!(segmentation.document.len(), 7);
    for (index, section) in segmentation.document.sections.iter().enumerate() {
        assert_eq!(section.name, headers[index]);
        assert_eq!(section.text, BODIES[index]);
        assert_eq!(section.order_index, index);
    }
    verify_segmentation(&segmentation.document, &headers).expect("all criteria present");
}

#[test]
fn section_spans_rebuild_text_from_first_header() {
    let headers = headers();
    let text = report_with_bodies(&headers, &BODIES);

    let segmentation = segment(&text, &headers);
    let rebuilt = segmentation
        .document
        .sections
        .iter()
        .map(|section| format!("{}\n{}\n", section.name, section.text))
        .collect::<String>();

    assert_eq!(rebuilt, text);
}

#[test]
fn missing_final_header_is_skipped() {
    let headers = headers();
    let text = report_with_bodies(&headers, &BODIES).replace(&headers[6], "");

    let segmentation = segment(&text, &headers);

    assert_eq!(segmentation.document.len(), 6);
    assert!(!segmentation.document.contains(&headers[6]));
    assert!(segmentation.document.sections[5].text.ends_with(BODIES[6]));
    assert_eq!(
        segmentation.diagnostics,
        vec![
            Diagnostic::UnterminatedSection {
                header: headers[5].clone(),
                next: headers[6].clone(),
            },
            Diagnostic::MissingHeader {
                header: headers[6].clone(),
            },
        ]
    );
}

#[test]
fn missing_middle_header_lets_previous_section_absorb_the_rest() {
    let headers = headers();
    let text = report_with_bodies(&headers, &BODIES).replace(&headers[2], "");

    let segmentation = segment(&text, &headers);

    assert_eq!(segmentation.document.len(), 2);
    assert!(segmentation.document.sections[1].text.contains(&headers[3]));
    assert!(segmentation.diagnostics.contains(&Diagnostic::MissingHeader {
        header: headers[2].clone()
    }));
    assert!(segmentation.diagnostics.contains(&Diagnostic::OutOfOrderHeader {
        header: headers[3].clone()
    }));
}

#[test]
fn out_of_order_header_is_reported_and_omitted() {
    let headers = headers();
    let text = format!(
        "{}\nBody two\n{}\nBody one\n",
        headers[1], headers[0]
    );
    let two = [headers[0].clone(), headers[1].clone()];

    let segmentation = segment(&text, &two);

    assert_eq!(segmentation.document.len(), 1);
    assert_eq!(segmentation.document.sections[0].name, headers[0]);
    assert_eq!(segmentation.document.sections[0].text, "Body one");
    assert_eq!(
        segmentation.diagnostics,
        vec![
            Diagnostic::UnterminatedSection {
                header: headers[0].clone(),
                next: headers[1].clone(),
            },
            Diagnostic::OutOfOrderHeader {
                header: headers[1].clone(),
            },
        ]
    );
}

#[test]
fn verify_reports_missing_criteria_as_numerals() {
    let headers = headers();
    let text = report_with_bodies(&headers, &BODIES).replace(&headers[5], "");

    let segmentation = segment(&text, &headers);
    let err = verify_segmentation(&segmentation.document, &headers).expect_err("incomplete");

    match err {
        PipelineError::IncompleteSegmentation {
            found,
            required,
            missing,
        } => {
            assert_eq!(found, 5);
            assert_eq!(required, 7);
            assert_eq!(missing, vec!["VI".to_string(), "VII".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_text_yields_no_sections() {
    let headers = headers();
    let segmentation = segment("", &headers);

    assert!(segmentation.document.sections.is_empty());
    assert_eq!(segmentation.diagnostics.len(), 7);
}

#[test]
fn roman_numeral_covers_criterion_range() {
    let numerals = (1..=7).map(roman_numeral).collect::<Vec<String>>();
    assert_eq!(numerals, vec!["I", "II", "III", "IV", "V", "VI", "VII"]);
    assert_eq!(roman_numeral(1994), "MCMXCIV");
}

#[test]
fn strip_page_markers_keeps_header_spacing() {
    let text = "CRITERION I  : Curricular Aspects\nPage 3 of 40\nBody";
    let cleaned = strip_page_markers(text).expect("strip markers");

    assert_eq!(cleaned, "CRITERION I  : Curricular Aspects\n\nBody");
}

#[test]
fn run_writes_debug_report_when_criteria_are_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input_path = dir.path().join("raw.json");
    let output_path = dir.path().join("segmented.json");
    let headers = headers();
    let text = report_with_bodies(&headers[..4], &BODIES[..4]);
    fs::write(
        &input_path,
        serde_json::to_vec(&RawTextDocument { raw_text: text }).expect("encode raw text"),
    )
    .expect("write raw text");

    let err = run(SegmentArgs {
        input_path,
        output_path: output_path.clone(),
        profile_path: None,
        keep_page_markers: false,
    })
    .expect_err("segmentation incomplete");

    assert!(err.to_string().contains("4/7"));
    assert!(!output_path.exists());
    assert!(dir.path().join("segmented.debug.json").exists());
}
