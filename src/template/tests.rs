use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::FileOptions;

use super::*;
use crate::commands::regenerate::{RenderSummary, render_blocks};
use crate::config::ConverterConfig;
use crate::docx::{DocumentSource, DocxWriter, NumberFormat, PlainTextSource};
use crate::serialize::serialize_tree;
use crate::structure::{ErrorType, LevelType, StructureEngine};

const W_NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

fn template_package() -> DocxPackage {
    let numbering = format!(
        r#"<w:numbering {W_NS}>
<w:abstractNum w:abstractNumId="7">
  <w:lvl w:ilvl="0"><w:numFmt w:val="upperLetter"/><w:lvlText w:val="%1."/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>
  <w:lvl w:ilvl="1"><w:numFmt w:val="decimal"/><w:lvlText w:val="%2."/><w:pStyle w:val="BWAList"/><w:suff w:val="space"/></w:lvl>
</w:abstractNum>
<w:num w:numId="4"><w:abstractNumId w:val="7"/></w:num>
</w:numbering>"#
    );
    let styles = format!(
        r#"<w:styles {W_NS}>
<w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
<w:style w:type="paragraph" w:styleId="BWAPart"><w:name w:val="BWA-PART"/><w:pPr><w:jc w:val="center"/></w:pPr></w:style>
<w:style w:type="paragraph" w:styleId="BWAItem"><w:name w:val="BWA-Item"/><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="4"/></w:numPr></w:pPr></w:style>
<w:style w:type="paragraph" w:styleId="BWAList"><w:name w:val="BWA-List"/></w:style>
</w:styles>"#
    );
    let document = format!(r#"<w:document {W_NS}><w:body/></w:document>"#);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options: FileOptions<()> = FileOptions::default();
    for (name, body) in [
        ("word/document.xml", document),
        ("word/styles.xml", styles),
        ("word/numbering.xml", numbering),
    ] {
        zip.start_file(name, options).expect("start zip entry");
        zip.write_all(body.as_bytes()).expect("write zip entry");
    }
    let bytes = zip.finish().expect("finish zip").into_inner();
    DocxPackage::from_bytes(bytes, "template.docx").expect("open template")
}

fn mapping() -> TemplateLevelMapping {
    let package = template_package();
    TemplateLevelMapping::load(&package, package.label(), &ConverterConfig::default().styles)
        .expect("analyze template")
}

#[test]
fn item_style_resolves_numbering_through_style_definition() {
    let descriptor = mapping().resolve(LevelType::Item);

    assert_eq!(descriptor.style_id, "BWAItem");
    assert_eq!(descriptor.style_name, "BWA-Item");
    assert_eq!(descriptor.numbering_id.as_deref(), Some("4"));
    assert_eq!(descriptor.abstract_num_id.as_deref(), Some("7"));
    assert_eq!(descriptor.list_level_index, Some(0));
    assert_eq!(descriptor.number_format, Some(NumberFormat::UpperLetter));
    assert_eq!(descriptor.level_text.as_deref(), Some("%1."));
    assert_eq!(descriptor.indentation.left, Some(720));
    assert_eq!(descriptor.suffix.as_deref(), Some("tab"));
    assert_eq!(descriptor.justification.as_deref(), Some("left"));
    assert!(descriptor.is_numbered());
    assert!(!descriptor.used_fallback_styling);
}

#[test]
fn list_style_resolves_numbering_through_level_style_link() {
    let descriptor = mapping().resolve(LevelType::List);

    assert_eq!(descriptor.style_id, "BWAList");
    assert_eq!(descriptor.numbering_id.as_deref(), Some("4"));
    assert_eq!(descriptor.list_level_index, Some(1));
    assert_eq!(descriptor.suffix.as_deref(), Some("space"));
}

#[test]
fn title_levels_share_their_numbered_level_style() {
    let mapping = mapping();

    let part_title = mapping.resolve(LevelType::PartTitle);
    assert_eq!(part_title.level_type, LevelType::PartTitle);
    assert_eq!(part_title.style_id, "BWAPart");
    assert_eq!(part_title.justification.as_deref(), Some("center"));
    assert!(!part_title.is_numbered());
}

#[test]
fn missing_levels_fall_back_to_normal() {
    let mapping = mapping();

    let sub_list = mapping.resolve(LevelType::SubList);
    assert_eq!(sub_list.style_name, "Normal");
    assert!(sub_list.used_fallback_styling);

    let content = mapping.resolve(LevelType::Content);
    assert_eq!(content.style_name, "Normal");
    assert!(!content.used_fallback_styling);

    assert!(mapping.missing_levels().contains(&LevelType::Subsection));
    assert!(mapping.missing_levels().contains(&LevelType::SubList));
    assert!(!mapping.missing_levels().contains(&LevelType::Item));
}

#[test]
fn analysis_reports_counts_and_levels() {
    let analysis = mapping().analysis();

    assert_eq!(analysis.template.as_deref(), Some("template.docx"));
    assert_eq!(analysis.fallback_style, "Normal");
    assert_eq!(analysis.abstract_numbering_count, 1);
    assert_eq!(analysis.numbering_instance_count, 1);
    assert_eq!(analysis.style_count, 4);
    assert_eq!(analysis.levels.len(), 3);
    assert_eq!(analysis.missing_levels.len(), 5);
}

#[test]
fn fallback_styling_reaches_serialized_blocks() {
    let config = ConverterConfig::default();
    let source = PlainTextSource::from_text(
        "1.0 GENERAL\n1.01 SCOPE\nA. Provide the following:\n1. Conduit\na. Rigid steel\n",
    );
    let paragraphs = source.read_paragraphs().expect("read text");
    let extraction = StructureEngine::new(&config)
        .expect("engine")
        .extract(&paragraphs, None);

    let serialized = serialize_tree(&extraction.tree, &mapping());
    let by_level = |level_type: LevelType| {
        serialized
            .blocks
            .iter()
            .find(|block| block.level_type == level_type)
            .expect("block for level")
    };

    let item = by_level(LevelType::Item);
    assert!(!item.used_fallback_styling);
    assert_eq!(item.bwa_level_name.as_deref(), Some("BWA-Item"));
    assert_eq!(item.numbering_id.as_deref(), Some("4"));

    let sub_list = by_level(LevelType::SubList);
    assert!(sub_list.used_fallback_styling);
    assert_eq!(sub_list.style_name, "Normal");
    assert_eq!(sub_list.bwa_level_name, None);

    let mapping_errors = serialized.mapping_errors.entries();
    assert_eq!(mapping_errors.len(), 2);
    assert!(
        mapping_errors
            .iter()
            .all(|error| error.error_type == ErrorType::TemplateMappingError)
    );
}

#[test]
fn rendered_blocks_flag_fallback_and_reconstructed_paragraphs() {
    let config = ConverterConfig::default();
    let source = PlainTextSource::from_text(
        "1.0 GENERAL\n1.01 SCOPE\nA. Provide the following:\n1. Conduit\nProvide wire\na. Rigid steel\n",
    );
    let paragraphs = source.read_paragraphs().expect("read text");
    let extraction = StructureEngine::new(&config)
        .expect("engine")
        .extract(&paragraphs, None);
    let mapping = mapping();
    let serialized = serialize_tree(&extraction.tree, &mapping);

    let mut writer = DocxWriter::new();
    let summary = render_blocks(&serialized.blocks, &mapping, &mut writer);
    assert_eq!(
        summary,
        RenderSummary {
            paragraphs: 6,
            fallback: 2,
            reconstructed: 1,
        }
    );
    assert_eq!(writer.paragraph_count(), 6);

    let xml = writer.document_xml();
    let rendered = xml.split("<w:p>").skip(1).collect::<Vec<_>>();
    assert_eq!(rendered.len(), 6);

    let part = rendered[0];
    assert!(part.contains(r#"<w:pStyle w:val="BWAPart"/>"#));
    assert!(part.contains(r#"<w:t xml:space="preserve">1.0</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve">GENERAL</w:t>"#));
    assert!(!part.contains("w:highlight"));

    let subsection = rendered[1];
    assert!(subsection.contains(r#"<w:pStyle w:val="Normal"/>"#));
    assert!(subsection.contains(r#"<w:highlight w:val="yellow"/>"#));
    assert!(subsection.contains(r#">1.01</w:t>"#));

    let item = rendered[2];
    assert!(item.contains(r#"<w:numId w:val="4"/>"#));
    assert!(item.contains(r#"<w:t xml:space="preserve">Provide the following:</w:t>"#));
    assert!(!item.contains(r#">A</w:t>"#));
    assert!(!item.contains("w:highlight"));

    let rebuilt_list = rendered[4];
    assert!(rebuilt_list.contains(r#"<w:t xml:space="preserve">Provide wire</w:t>"#));
    assert!(rebuilt_list.contains(r#"<w:highlight w:val="cyan"/>"#));

    let sub_list = rendered[5];
    assert!(sub_list.contains(r#"<w:highlight w:val="yellow"/>"#));
    assert!(sub_list.contains(r#"<w:t xml:space="preserve">a</w:t></w:r><w:r><w:rPr><w:highlight w:val="yellow"/></w:rPr><w:tab/><w:t xml:space="preserve">Rigid steel</w:t>"#));
}

#[test]
fn unstyled_mapping_flags_every_structural_level() {
    let mapping = TemplateLevelMapping::unstyled(&ConverterConfig::default().styles);

    assert_eq!(mapping.missing_levels().len(), 8);
    assert!(mapping.resolve(LevelType::Part).used_fallback_styling);
    assert_eq!(mapping.analysis().template, None);
}
