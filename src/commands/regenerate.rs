use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::RegenerateArgs;
use crate::config::load_config;
use crate::docx::{DocumentSink, DocxWriter, Highlight, StyleApplier};
use crate::model::ConversionDocument;
use crate::serialize::{ContentBlock, rebuild_tree};
use crate::structure::{ErrorType, validate};
use crate::template::{StyleDescriptor, TemplateLevelMapping, load_template};
use crate::util::{document_stem, read_json, sibling_output};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub paragraphs: usize,
    pub fallback: usize,
    pub reconstructed: usize,
}

pub fn run(args: RegenerateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let document: ConversionDocument = read_json(&args.json)?;
    let template = load_template(&args.template, &config.styles)?;

    let rebuilt = rebuild_tree(&document.content_blocks);
    let issues = validate(&rebuilt);
    if !issues.is_empty() {
        warn!(
            path = %args.json.display(),
            structure_errors = issues.count_of(ErrorType::StructureError),
            sequence_errors = issues.count_of(ErrorType::NumberingSequenceError),
            "content blocks carry structural issues"
        );
    }

    let mut writer = DocxWriter::with_template(&template.package);
    let summary = render_blocks(&document.content_blocks, &template.mapping, &mut writer);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.json));
    writer.save(&output)?;

    info!(
        path = %output.display(),
        paragraphs = summary.paragraphs,
        fallback = summary.fallback,
        reconstructed = summary.reconstructed,
        "regenerated document"
    );

    Ok(())
}

pub fn render_blocks<W>(
    blocks: &[ContentBlock],
    mapping: &TemplateLevelMapping,
    writer: &mut W,
) -> RenderSummary
where
    W: DocumentSink + StyleApplier,
{
    let mut summary = RenderSummary::default();

    for block in blocks {
        let descriptor = mapping.resolve(block.level_type);
        let handle = writer.write_paragraph(&paragraph_text(block, &descriptor), &descriptor.style_id);
        writer.apply(handle, &descriptor);

        if descriptor.used_fallback_styling {
            summary.fallback += 1;
        } else if block.reconstructed {
            writer.highlight(handle, Highlight::Cyan);
        }
        if block.reconstructed {
            summary.reconstructed += 1;
        }
        summary.paragraphs += 1;
    }

    summary
}

fn paragraph_text(block: &ContentBlock, descriptor: &StyleDescriptor) -> String {
    if block.level_type.is_header() {
        return block.text.trim().to_string();
    }

    match block.number.as_deref() {
        Some(number) if !descriptor.is_numbered() => {
            if block.content.is_empty() {
                number.to_string()
            } else {
                format!("{number}\t{}", block.content)
            }
        }
        _ => block.content.clone(),
    }
}

fn default_output(json: &Path) -> PathBuf {
    let stem = document_stem(json);
    let stem = stem.strip_suffix("_content").unwrap_or(&stem);
    let dir = json.parent().unwrap_or_else(|| Path::new("."));
    sibling_output(dir, stem, "_regenerated.docx")
}
