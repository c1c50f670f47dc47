use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{ConversionDocument, ErrorCounts};
use crate::structure::{ErrorType, ExtractionError};
use crate::util::ensure_directory;

const REPORT_CONTEXT_CHARS: usize = 100;
const RULE: &str = "================================================================";

pub fn error_counts(errors: &[ExtractionError]) -> ErrorCounts {
    let mut counts = ErrorCounts::default();
    for error in errors {
        match error.error_type {
            ErrorType::StructureError => counts.structure_error += 1,
            ErrorType::NumberingSequenceError => counts.numbering_sequence_error += 1,
            ErrorType::ContentError => counts.content_error += 1,
            ErrorType::ContentWarning => counts.content_warning += 1,
            ErrorType::TemplateMappingError => counts.template_mapping_error += 1,
        }
    }
    counts
}

pub fn render_report(document: &ConversionDocument) -> String {
    let mut out = String::new();
    out.push_str("SPECIFICATION CONVERSION REPORT\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!("Generated: {}\n", document.generated_at));
    out.push_str(&format!("Source: {}\n", document.source_file));
    if let Some(number) = &document.section_number {
        let title = document.section_title.as_deref().unwrap_or("");
        out.push_str(&format!("Section: {number} {title}\n"));
    }
    out.push('\n');

    if !document.list_fixes.is_empty() {
        out.push_str(&format!("LIST NUMBERING FIXES ({})\n", document.list_fixes.len()));
        for fix in &document.list_fixes {
            out.push_str(&format!(
                "  Line {}: '{}' detected {} -> corrected {} (list {}, level {})\n",
                fix.line_number,
                fix.text,
                fix.detected_number.as_deref().unwrap_or("-"),
                fix.correct_number,
                fix.list_id,
                fix.list_level
            ));
        }
        out.push('\n');
    }

    let mut grouped: BTreeMap<ErrorType, Vec<&ExtractionError>> = BTreeMap::new();
    for error in &document.processing_errors {
        grouped.entry(error.error_type).or_default().push(error);
    }

    if grouped.is_empty() {
        out.push_str("No processing errors detected.\n\n");
    }

    for (error_type, errors) in &grouped {
        out.push_str(&format!("{} ({})\n", error_type.label(), errors.len()));
        for error in errors {
            out.push_str(&format!("  Line {}: {}\n", error.line_number, error.message));
            if !error.context.is_empty() {
                out.push_str(&format!("    Context: {}\n", truncate(&error.context)));
            }
            if let (Some(expected), Some(found)) = (&error.expected, &error.found) {
                out.push_str(&format!("    Expected: {expected}  Found: {found}\n"));
            }
        }
        out.push('\n');
    }

    let reconstructed = document
        .content_blocks
        .iter()
        .filter(|block| block.reconstructed)
        .collect::<Vec<_>>();
    if !reconstructed.is_empty() {
        out.push_str(&format!("RECONSTRUCTED ENTRIES FOR REVIEW ({})\n", reconstructed.len()));
        for block in reconstructed {
            out.push_str(&format!(
                "  Line {}: {} {} '{}'\n",
                block.line_number,
                block.level_type.as_str(),
                block.number.as_deref().unwrap_or("-"),
                truncate(&block.content)
            ));
        }
        out.push('\n');
    }

    let fallback = document
        .content_blocks
        .iter()
        .filter(|block| block.used_fallback_styling)
        .collect::<Vec<_>>();
    if !fallback.is_empty() {
        out.push_str(&format!("FALLBACK STYLING ({})\n", fallback.len()));
        for block in fallback {
            out.push_str(&format!(
                "  Line {}: {} styled as '{}'\n",
                block.line_number,
                block.level_type.as_str(),
                block.style_name
            ));
        }
        out.push('\n');
    }

    let counts = error_counts(&document.processing_errors);
    out.push_str("SUMMARY\n");
    out.push_str(RULE);
    out.push('\n');
    for (error_type, count) in [
        (ErrorType::StructureError, counts.structure_error),
        (ErrorType::NumberingSequenceError, counts.numbering_sequence_error),
        (ErrorType::ContentError, counts.content_error),
        (ErrorType::ContentWarning, counts.content_warning),
        (ErrorType::TemplateMappingError, counts.template_mapping_error),
    ] {
        out.push_str(&format!("  {}: {count}\n", error_type.as_str()));
    }
    out.push_str(&format!("  total: {}\n", document.processing_errors.len()));
    out.push_str(&format!("  list_fixes: {}\n", document.list_fixes.len()));
    out.push_str(&format!("  header_paragraphs: {}\n", document.header.paragraphs.len()));
    out.push_str(&format!("  footer_paragraphs: {}\n", document.footer.paragraphs.len()));
    out.push_str(&format!("  comments: {}\n", document.comments.len()));

    out
}

pub fn write_report(path: &Path, document: &ConversionDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    fs::write(path, render_report(document))
        .with_context(|| format!("failed to write error report: {}", path.display()))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= REPORT_CONTEXT_CHARS {
        return text.to_string();
    }

    let mut out = text.chars().take(REPORT_CONTEXT_CHARS).collect::<String>();
    out.push_str("...");
    out
}
