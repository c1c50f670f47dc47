use std::path::Path;

use anyhow::{Result, bail};

use crate::template::StyleDescriptor;

mod comments;
mod layout;
mod numbering;
mod package;
mod styles;
#[cfg(test)]
mod tests;
mod text;
mod writer;
mod xml;

pub use comments::DocumentComment;
pub use layout::{HeaderFooterContent, PageLayout, PageMargins};
pub use numbering::{
    AbstractNumbering, Indentation, NumberFormat, NumberingLevel, NumberingTable,
    parse_numbering_xml,
};
pub use package::DocxPackage;
pub use styles::{StyleDefinition, StyleTable, parse_styles_xml};
pub use text::PlainTextSource;
pub use writer::DocxWriter;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub index: usize,
    pub text: String,
    pub list_id: Option<String>,
    pub list_level: Option<u8>,
    pub style_id: Option<String>,
}

impl Paragraph {
    pub fn plain(index: usize, text: &str) -> Self {
        Self {
            index,
            text: text.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Yellow,
    Cyan,
}

impl Highlight {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Cyan => "cyan",
        }
    }
}

pub trait DocumentSource {
    fn read_paragraphs(&self) -> Result<Vec<Paragraph>>;
    fn read_numbering_definitions(&self) -> Result<NumberingTable>;
    fn read_styles(&self) -> Result<StyleTable>;

    /// Header, footer and margins of the first section; empty for sources without pages.
    fn read_page_layout(&self) -> Result<PageLayout> {
        Ok(PageLayout::default())
    }

    fn read_comments(&self) -> Result<Vec<DocumentComment>> {
        Ok(Vec::new())
    }
}

pub trait DocumentSink {
    fn write_paragraph(&mut self, text: &str, style_name: &str) -> ParagraphHandle;
}

pub trait StyleApplier {
    fn apply(&mut self, handle: ParagraphHandle, descriptor: &StyleDescriptor);
    fn highlight(&mut self, handle: ParagraphHandle, highlight: Highlight);
}

pub fn open_source(path: &Path) -> Result<Box<dyn DocumentSource>> {
    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase());

    match extension.as_deref() {
        Some("docx") => Ok(Box::new(DocxPackage::open(path)?)),
        Some("txt") => Ok(Box::new(PlainTextSource::open(path)?)),
        _ => bail!(
            "unsupported document type (expected .docx or .txt): {}",
            path.display()
        ),
    }
}
