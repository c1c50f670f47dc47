use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::numbering::NumberingTable;
use super::styles::StyleTable;
use super::{DocumentSource, Paragraph};

#[derive(Debug, Clone)]
pub struct PlainTextSource {
    text: String,
}

impl PlainTextSource {
    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read text document: {}", path.display()))?;
        Ok(Self::from_text(text))
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl DocumentSource for PlainTextSource {
    fn read_paragraphs(&self) -> Result<Vec<Paragraph>> {
        Ok(self
            .text
            .lines()
            .enumerate()
            .map(|(index, line)| Paragraph::plain(index, line.trim_end_matches('\r')))
            .collect())
    }

    fn read_numbering_definitions(&self) -> Result<NumberingTable> {
        Ok(NumberingTable::default())
    }

    fn read_styles(&self) -> Result<StyleTable> {
        Ok(StyleTable::default())
    }
}
