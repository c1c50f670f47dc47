use anyhow::Result;
use tracing::debug;

use crate::config::{ConverterConfig, HeuristicThresholds};
use crate::docx::{NumberingTable, Paragraph};

mod classify;
mod errors;
mod heuristics;
mod numbering;
mod recover;
mod tree;
mod validate;

pub use classify::{Classifier, LevelType, NumberOrigin, section_code};
pub use errors::{ErrorLog, ErrorType, ExtractionError};
pub use heuristics::strip_numbering_prefix;
pub use numbering::{ListFix, first_number};
pub use recover::recover;
pub use tree::{
    Entry, HeaderLine, ItemNode, ListNode, LooseParagraph, PartNode, Provenance, SpecTree,
    SubListNode, SubsectionNode, TreeCounts,
};
pub use validate::validate;

#[derive(Debug, Default)]
pub struct Extraction {
    pub tree: SpecTree,
    pub errors: ErrorLog,
    pub list_fixes: Vec<ListFix>,
    pub classified_count: usize,
}

#[derive(Debug, Clone)]
pub struct StructureEngine {
    classifier: Classifier,
    thresholds: HeuristicThresholds,
}

impl StructureEngine {
    pub fn new(config: &ConverterConfig) -> Result<Self> {
        Ok(Self {
            classifier: Classifier::new(&config.vocabulary, &config.heuristics)?,
            thresholds: config.heuristics.clone(),
        })
    }

    pub fn extract(&self, paragraphs: &[Paragraph], numbering: Option<&NumberingTable>) -> Extraction {
        let classified = self.classifier.classify_document(paragraphs, numbering);
        debug!(
            paragraphs = classified.paragraphs.len(),
            list_fixes = classified.list_fixes.len(),
            "classified paragraphs"
        );

        let recovery = recover(&classified.paragraphs, &self.thresholds);
        let validation = validate(&recovery.tree);

        let mut errors = classified.errors;
        errors.extend(recovery.errors);
        errors.extend(validation);
        errors.sort_by_line();

        Extraction {
            tree: recovery.tree,
            errors,
            list_fixes: classified.list_fixes,
            classified_count: classified.paragraphs.len(),
        }
    }
}
