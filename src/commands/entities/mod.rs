use anyhow::Result;
use tracing::info;

use crate::cli::EntitiesArgs;
use crate::model::{Entity, OrderedMap, SegmentedDocument};
use crate::util::{read_json, write_json_pretty};

mod rules;

pub use rules::RuleEntityExtractor;

pub type SectionEntities = OrderedMap<Vec<Entity>>;

/// Finds labelled spans in section text. Offsets are character positions.
pub trait EntityExtractor {
    fn extract(&self, text: &str) -> Vec<Entity>;
}

pub fn run(args: EntitiesArgs) -> Result<()> {
    let document: SegmentedDocument = read_json(&args.segmented_path)?;
    let extractor = RuleEntityExtractor::new()?;
    let entities = extract_document(&document, &extractor);

    write_json_pretty(&args.output_path, &entities)?;
    info!(
        path = %args.output_path.display(),
        sections = entities.len(),
        entities = entities.values().map(Vec::len).sum::<usize>(),
        "wrote entities"
    );
    Ok(())
}

/// Sections without any entity are left out.
pub fn extract_document(
    document: &SegmentedDocument,
    extractor: &dyn EntityExtractor,
) -> SectionEntities {
    document
        .sections
        .iter()
        .map(|section| (section.name.clone(), extractor.extract(&section.text)))
        .filter(|(_, entities)| !entities.is_empty())
        .collect()
}
