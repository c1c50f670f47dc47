use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use super::regenerate::render_blocks;
use crate::cli::ConvertArgs;
use crate::config::load_config;
use crate::docx::{DocxWriter, open_source};
use crate::model::{
    CommentsExport, ConversionDocument, ConversionManifest, ConvertedDocument, DocumentCounts,
    DocumentOutputs, HeaderFooterExport, MANIFEST_VERSION,
};
use crate::report::{error_counts, write_report};
use crate::serialize::serialize_tree;
use crate::structure::{StructureEngine, section_code};
use crate::template::{LoadedTemplate, TemplateLevelMapping, load_template};
use crate::util::{
    document_stem, ensure_directory, now_utc_string, sha256_file, sibling_output,
    utc_compact_string, write_json_pretty,
};

const MANIFEST_FILE: &str = "conversion_manifest.json";

pub fn run(args: ConvertArgs) -> Result<()> {
    let started_at = now_utc_string();
    let run_id = utc_compact_string(Utc::now());

    let config = load_config(args.config.as_deref())?;
    let engine = StructureEngine::new(&config)?;
    let template = args
        .template
        .as_deref()
        .map(|path| load_template(path, &config.styles))
        .transpose()?;
    let mapping = match &template {
        Some(loaded) => loaded.mapping.clone(),
        None => {
            warn!("no template given; all structural levels use the fallback style");
            TemplateLevelMapping::unstyled(&config.styles)
        }
    };

    ensure_directory(&args.output_dir)?;

    let outcome = convert_document(&args, &engine, &mapping, template.as_ref());
    let (status, documents) = match &outcome {
        Ok(converted) => ("completed", vec![converted.clone()]),
        Err(_) => ("failed", Vec::new()),
    };

    let manifest = ConversionManifest {
        manifest_version: MANIFEST_VERSION,
        run_id,
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: std::env::args().collect(),
        template_path: args.template.as_ref().map(|path| path.display().to_string()),
        config_path: args.config.as_ref().map(|path| path.display().to_string()),
        documents,
    };
    let manifest_path = args.output_dir.join(MANIFEST_FILE);
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), status, "wrote conversion manifest");

    outcome.map(|_| ())
}

fn convert_document(
    args: &ConvertArgs,
    engine: &StructureEngine,
    mapping: &TemplateLevelMapping,
    template: Option<&LoadedTemplate>,
) -> Result<ConvertedDocument> {
    let input = args.input.as_path();
    let source = open_source(input)?;
    let paragraphs = source
        .read_paragraphs()
        .with_context(|| format!("failed to read paragraphs: {}", input.display()))?;
    let numbering = source
        .read_numbering_definitions()
        .with_context(|| format!("failed to read numbering definitions: {}", input.display()))?;
    let layout = source.read_page_layout().unwrap_or_else(|err| {
        warn!(path = %input.display(), error = %err, "could not read header, footer or margins");
        Default::default()
    });
    let comments = source.read_comments().unwrap_or_else(|err| {
        warn!(path = %input.display(), error = %err, "could not read comments");
        Vec::new()
    });
    let source_sha256 = sha256_file(input)?;
    info!(path = %input.display(), paragraphs = paragraphs.len(), "read source document");

    let extraction = engine.extract(&paragraphs, Some(&numbering));
    let serialized = serialize_tree(&extraction.tree, mapping);

    let mut errors = extraction.errors;
    errors.extend(serialized.mapping_errors);
    errors.sort_by_line();

    let tree_counts = extraction.tree.counts();
    info!(
        parts = tree_counts.parts,
        subsections = tree_counts.subsections,
        items = tree_counts.items,
        reconstructed = tree_counts.reconstructed,
        errors = errors.len(),
        list_fixes = extraction.list_fixes.len(),
        "recovered document structure"
    );

    let header = &extraction.tree.header;
    let document = ConversionDocument {
        manifest_version: MANIFEST_VERSION,
        generated_at: now_utc_string(),
        source_file: input.display().to_string(),
        source_sha256: source_sha256.clone(),
        section_number: header.section_number().map(str::to_string),
        section_code: header.section_number().and_then(section_code),
        section_title: header.section_title().map(str::to_string),
        end_of_section: header.end_of_section.as_ref().map(|line| line.text.clone()),
        header: layout.header,
        footer: layout.footer,
        margins: layout.margins,
        comments,
        content_blocks: serialized.blocks,
        template_analysis: mapping.analysis(),
        processing_errors: errors.into_vec(),
        list_fixes: extraction.list_fixes,
    };

    let stem = document_stem(input);
    let content_json = sibling_output(&args.output_dir, &stem, "_content.json");
    write_json_pretty(&content_json, &document)?;
    info!(path = %content_json.display(), blocks = document.content_blocks.len(), "wrote content json");

    let error_report = sibling_output(&args.output_dir, &stem, "_errors.txt");
    write_report(&error_report, &document)?;
    info!(
        path = %error_report.display(),
        errors = document.processing_errors.len(),
        "wrote error report"
    );

    let header_footer_json = sibling_output(&args.output_dir, &stem, "_header_footer.json");
    write_json_pretty(&header_footer_json, &HeaderFooterExport::from_document(&document))?;
    let comments_json = sibling_output(&args.output_dir, &stem, "_comments.json");
    write_json_pretty(&comments_json, &CommentsExport::from_document(&document))?;
    info!(
        header_paragraphs = document.header.paragraphs.len(),
        footer_paragraphs = document.footer.paragraphs.len(),
        comments = document.comments.len(),
        "wrote header, footer and comments json"
    );

    let processed_docx = if args.skip_docx {
        None
    } else {
        match template {
            Some(loaded) => {
                let path = sibling_output(&args.output_dir, &stem, "_processed.docx");
                write_processed(&path, &document, loaded)?;
                Some(path.display().to_string())
            }
            None => {
                warn!(path = %input.display(), "skipping processed docx without a template");
                None
            }
        }
    };

    let counts = DocumentCounts {
        paragraphs: paragraphs.len(),
        content_blocks: document.content_blocks.len(),
        fallback_blocks: document
            .content_blocks
            .iter()
            .filter(|block| block.used_fallback_styling)
            .count(),
        list_fixes: document.list_fixes.len(),
        comments: document.comments.len(),
        tree: tree_counts,
        errors: error_counts(&document.processing_errors),
    };

    Ok(ConvertedDocument {
        source_file: document.source_file.clone(),
        source_sha256,
        status: "converted".to_string(),
        outputs: DocumentOutputs {
            content_json: content_json.display().to_string(),
            error_report: error_report.display().to_string(),
            header_footer_json: header_footer_json.display().to_string(),
            comments_json: comments_json.display().to_string(),
            processed_docx,
        },
        counts,
    })
}

fn write_processed(path: &Path, document: &ConversionDocument, template: &LoadedTemplate) -> Result<()> {
    let mut writer = DocxWriter::with_template(&template.package);
    let summary = render_blocks(&document.content_blocks, &template.mapping, &mut writer);
    writer.save(path)?;

    info!(
        path = %path.display(),
        paragraphs = summary.paragraphs,
        fallback = summary.fallback,
        reconstructed = summary.reconstructed,
        "wrote processed docx"
    );
    Ok(())
}
