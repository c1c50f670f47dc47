use serde::{Deserialize, Serialize};

use crate::docx::{DocumentComment, HeaderFooterContent, PageMargins};
use crate::serialize::ContentBlock;
use crate::structure::{ExtractionError, ListFix, TreeCounts};
use crate::template::TemplateAnalysis;

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionDocument {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_file: String,
    pub source_sha256: String,
    pub section_number: Option<String>,
    pub section_code: Option<String>,
    pub section_title: Option<String>,
    pub end_of_section: Option<String>,
    #[serde(default)]
    pub header: HeaderFooterContent,
    #[serde(default)]
    pub footer: HeaderFooterContent,
    #[serde(default)]
    pub margins: PageMargins,
    #[serde(default)]
    pub comments: Vec<DocumentComment>,
    pub content_blocks: Vec<ContentBlock>,
    pub template_analysis: TemplateAnalysis,
    pub processing_errors: Vec<ExtractionError>,
    pub list_fixes: Vec<ListFix>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderFooterExport {
    pub header: HeaderFooterContent,
    pub footer: HeaderFooterContent,
    pub margins: PageMargins,
    pub extraction_timestamp: String,
    pub source_file: String,
}

impl HeaderFooterExport {
    pub fn from_document(document: &ConversionDocument) -> Self {
        Self {
            header: document.header.clone(),
            footer: document.footer.clone(),
            margins: document.margins,
            extraction_timestamp: document.generated_at.clone(),
            source_file: document.source_file.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentsExport {
    pub comments: Vec<DocumentComment>,
    pub extraction_timestamp: String,
    pub source_file: String,
}

impl CommentsExport {
    pub fn from_document(document: &ConversionDocument) -> Self {
        Self {
            comments: document.comments.clone(),
            extraction_timestamp: document.generated_at.clone(),
            source_file: document.source_file.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorCounts {
    pub structure_error: usize,
    pub numbering_sequence_error: usize,
    pub content_error: usize,
    pub content_warning: usize,
    pub template_mapping_error: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentCounts {
    pub paragraphs: usize,
    pub content_blocks: usize,
    pub fallback_blocks: usize,
    pub list_fixes: usize,
    pub comments: usize,
    pub tree: TreeCounts,
    pub errors: ErrorCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutputs {
    pub content_json: String,
    pub error_report: String,
    pub header_footer_json: String,
    pub comments_json: String,
    pub processed_docx: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertedDocument {
    pub source_file: String,
    pub source_sha256: String,
    pub status: String,
    pub outputs: DocumentOutputs,
    pub counts: DocumentCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: Vec<String>,
    pub template_path: Option<String>,
    pub config_path: Option<String>,
    pub documents: Vec<ConvertedDocument>,
}
