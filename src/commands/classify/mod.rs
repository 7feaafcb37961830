use anyhow::Result;
use tracing::{debug, info};

use crate::cli::ClassifyArgs;
use crate::model::{QlmPrediction, QlmPredictions, Section, SegmentedDocument};
use crate::util::{read_json, write_json_pretty};

mod lexical;
#[cfg(test)]
mod tests;

pub use lexical::LexicalClassifier;

pub const CRITERION_LABELS: [&str; 7] = [
    "1. Curricular Aspects",
    "2. Teaching-Learning",
    "3. Research",
    "4. Infrastructure",
    "5. Student Support",
    "6. Governance",
    "7. Best Practices",
];

/// Assigns a criterion label and a confidence in [0, 1] to one section.
pub trait SectionClassifier {
    fn classify(&self, section: &Section) -> Result<QlmPrediction>;
}

pub fn run(args: ClassifyArgs) -> Result<()> {
    let document: SegmentedDocument = read_json(&args.segmented_path)?;
    let classifier = LexicalClassifier::new()?;
    let predictions = classify_document(&document, &classifier)?;

    write_json_pretty(&args.output_path, &predictions)?;
    info!(
        path = %args.output_path.display(),
        predictions = predictions.len(),
        "wrote QlM predictions"
    );
    Ok(())
}

/// Classifies every criterion section, keyed by section name in document order.
pub fn classify_document(
    document: &SegmentedDocument,
    classifier: &dyn SectionClassifier,
) -> Result<QlmPredictions> {
    let mut predictions = QlmPredictions::new();

    for section in document
        .sections
        .iter()
        .filter(|section| is_criterion_section(&section.name))
    {
        let prediction = classifier.classify(section)?;
        debug!(
            section = %section.name,
            criterion = %prediction.predicted_criterion,
            confidence = prediction.confidence,
            "classified section"
        );
        predictions.insert(section.name.clone(), prediction);
    }

    Ok(predictions)
}

pub fn is_criterion_section(name: &str) -> bool {
    name.to_uppercase().contains("CRITERION")
}

