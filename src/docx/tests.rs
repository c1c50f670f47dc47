use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::FileOptions;

use super::*;
use crate::structure::LevelType;

const W_NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

fn docx_bytes(parts: &[(&str, String)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options: FileOptions<()> = FileOptions::default();
    for (name, body) in parts {
        zip.start_file(*name, options).expect("start zip entry");
        zip.write_all(body.as_bytes()).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

fn document(body: &str) -> String {
    format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:document {W_NS}><w:body>{body}</w:body></w:document>"#)
}

fn numbering() -> String {
    format!(
        r#"<w:numbering {W_NS}>
<w:abstractNum w:abstractNumId="10">
  <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="upperLetter"/><w:lvlText w:val="%1."/><w:pStyle w:val="BWAItem"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>
  <w:lvl w:ilvl="1"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%2."/><w:suff w:val="space"/></w:lvl>
</w:abstractNum>
<w:num w:numId="3"><w:abstractNumId w:val="10"/></w:num>
</w:numbering>"#
    )
}

fn styles() -> String {
    format!(
        r#"<w:styles {W_NS}>
<w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
<w:style w:type="paragraph" w:styleId="BWAItem"><w:name w:val="BWA-Item"/><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="3"/></w:numPr><w:jc w:val="both"/></w:pPr><w:rPr><w:jc w:val="left"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="BWAList"><w:name w:val="BWA-List"/><w:basedOn w:val="BWAItem"/><w:pPr><w:numPr><w:ilvl w:val="1"/></w:numPr></w:pPr></w:style>
<w:style w:type="paragraph" w:styleId="Plain"><w:name w:val="Plain"/><w:basedOn w:val="Normal"/></w:style>
</w:styles>"#
    )
}

#[test]
fn reader_collects_text_tabs_and_direct_numbering() {
    let body = r#"
<w:p><w:r><w:t>SECTION 26 05 00</w:t></w:r></w:p>
<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>1.01</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve">SCOPE </w:t></w:r><w:r><w:t>&amp; LIMITS</w:t></w:r></w:p>
<w:p><w:pPr><w:numPr><w:ilvl w:val="1"/><w:numId w:val="3"/></w:numPr></w:pPr><w:r><w:t>Provide</w:t><w:br/><w:t>materials</w:t></w:r></w:p>
<w:p/>
"#;
    let bytes = docx_bytes(&[("word/document.xml", document(body))]);
    let package = DocxPackage::from_bytes(bytes, "fixture.docx").expect("open fixture");

    let paragraphs = package.read_paragraphs().expect("read paragraphs");
    assert_eq!(paragraphs.len(), 4);
    assert_eq!(paragraphs[0].text, "SECTION 26 05 00");
    assert_eq!(paragraphs[1].text, "1.01\tSCOPE & LIMITS");
    assert_eq!(paragraphs[1].list_id, None);
    assert_eq!(paragraphs[2].text, "Provide materials");
    assert_eq!(paragraphs[2].list_id.as_deref(), Some("3"));
    assert_eq!(paragraphs[2].list_level, Some(1));
    assert_eq!(paragraphs[3].text, "");
    assert_eq!(paragraphs[3].index, 3);
}

#[test]
fn reader_inherits_numbering_from_paragraph_style() {
    let body = r#"
<w:p><w:pPr><w:pStyle w:val="BWAList"/></w:pPr><w:r><w:t>Conduit</w:t></w:r></w:p>
<w:p><w:pPr><w:pStyle w:val="BWAItem"/><w:numPr><w:numId w:val="0"/></w:numPr></w:pPr><w:r><w:t>Suppressed</w:t></w:r></w:p>
<w:p><w:pPr><w:pStyle w:val="Plain"/></w:pPr><w:r><w:t>Prose</w:t></w:r></w:p>
"#;
    let bytes = docx_bytes(&[
        ("word/document.xml", document(body)),
        ("word/styles.xml", styles()),
        ("word/numbering.xml", numbering()),
    ]);
    let package = DocxPackage::from_bytes(bytes, "fixture.docx").expect("open fixture");

    let paragraphs = package.read_paragraphs().expect("read paragraphs");
    assert_eq!(paragraphs[0].style_id.as_deref(), Some("BWAList"));
    assert_eq!(paragraphs[0].list_id.as_deref(), Some("3"));
    assert_eq!(paragraphs[0].list_level, Some(1));
    assert_eq!(paragraphs[1].list_id, None);
    assert_eq!(paragraphs[2].list_id, None);
}

#[test]
fn reader_skips_table_paragraphs() {
    let body = r#"
<w:p><w:r><w:t>Before</w:t></w:r></w:p>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
<w:p><w:r><w:t>After</w:t></w:r></w:p>
"#;
    let bytes = docx_bytes(&[("word/document.xml", document(body))]);
    let package = DocxPackage::from_bytes(bytes, "fixture.docx").expect("open fixture");

    let texts = package
        .read_paragraphs()
        .expect("read paragraphs")
        .into_iter()
        .map(|paragraph| paragraph.text)
        .collect::<Vec<_>>();
    assert_eq!(texts, vec!["Before", "After"]);
}

#[test]
fn package_without_document_part_is_rejected() {
    let bytes = docx_bytes(&[("word/styles.xml", styles())]);
    assert!(DocxPackage::from_bytes(bytes, "broken.docx").is_err());
    assert!(DocxPackage::from_bytes(b"not a zip".to_vec(), "plain.docx").is_err());
}

#[test]
fn numbering_definitions_parse_levels_and_instances() {
    let table = parse_numbering_xml(&numbering()).expect("parse numbering");

    assert_eq!(table.abstract_id("3"), Some("10"));
    let item = table.level("3", 0).expect("level 0");
    assert_eq!(item.num_fmt, NumberFormat::UpperLetter);
    assert_eq!(item.lvl_text.as_deref(), Some("%1."));
    assert_eq!(item.p_style.as_deref(), Some("BWAItem"));
    assert_eq!(item.indentation.left, Some(720));
    assert_eq!(item.indentation.hanging, Some(360));
    assert_eq!(table.level_format("3", 1), Some(NumberFormat::Decimal));
    assert_eq!(table.level("3", 1).and_then(|level| level.suffix.as_deref()), Some("space"));
    assert_eq!(table.level_format("9", 0), None);

    let (num_id, _, level) = table.level_for_style("BWAItem").expect("level linked to style");
    assert_eq!(num_id, "3");
    assert_eq!(level.ilvl, 0);
}

#[test]
fn styles_follow_based_on_chain_for_numbering() {
    let table = parse_styles_xml(&styles()).expect("parse styles");

    let item = table.by_name("bwa-item").expect("case-insensitive name lookup");
    assert_eq!(item.style_id, "BWAItem");
    assert_eq!(item.justification.as_deref(), Some("both"));
    assert_eq!(table.numbering_for("BWAItem"), Some(("3".to_string(), 0)));
    assert_eq!(table.numbering_for("Plain"), None);
    assert!(table.by_name("BWA-Part").is_none());
}

#[test]
fn page_layout_follows_default_section_references() {
    let body = r#"
<w:p><w:r><w:t>SECTION 26 05 00</w:t></w:r></w:p>
<w:sectPr xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:headerReference w:type="even" r:id="rId9"/>
  <w:headerReference w:type="default" r:id="rId7"/>
  <w:footerReference w:type="default" r:id="rId8"/>
  <w:pgMar w:top="1440" w:right="1080" w:bottom="1440" w:left="1080" w:header="720" w:footer="720" w:gutter="0"/>
</w:sectPr>
"#;
    let relationships = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header2.xml"/>
<Relationship Id="rId8" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>
<Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="/word/header1.xml"/>
</Relationships>"#;
    let header = format!(
        r#"<w:hdr {W_NS}>
<w:p><w:r><w:t>Project 2417</w:t></w:r></w:p>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Issued</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>2025-07-15</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
<w:p><w:r><w:pict><v:textbox><w:txbxContent><w:p><w:r><w:t>DRAFT</w:t></w:r></w:p></w:txbxContent></v:textbox></w:pict></w:r></w:p>
</w:hdr>"#
    );
    let even_header = format!(r#"<w:hdr {W_NS}><w:p><w:r><w:t>Even page</w:t></w:r></w:p></w:hdr>"#);
    let footer = format!(
        r#"<w:ftr {W_NS}><w:p><w:r><w:t xml:space="preserve">Page </w:t></w:r><w:fldSimple w:instr="PAGE"><w:r><w:t>3</w:t></w:r></w:fldSimple></w:p></w:ftr>"#
    );
    let bytes = docx_bytes(&[
        ("word/document.xml", document(body)),
        ("word/_rels/document.xml.rels", relationships.to_string()),
        ("word/header1.xml", even_header),
        ("word/header2.xml", header),
        ("word/footer1.xml", footer),
    ]);
    let package = DocxPackage::from_bytes(bytes, "fixture.docx").expect("open fixture");

    let layout = package.read_page_layout().expect("read page layout");
    assert_eq!(
        layout.header.paragraphs,
        vec!["Project 2417", "Issued", "2025-07-15", "DRAFT", "DRAFT"]
    );
    assert_eq!(
        layout.header.tables,
        vec![vec![vec!["Issued".to_string(), "2025-07-15".to_string()]]]
    );
    assert_eq!(layout.header.text_boxes, vec![vec!["DRAFT".to_string()]]);
    assert_eq!(layout.footer.paragraphs, vec!["Page 3"]);
    assert!(layout.footer.tables.is_empty());

    assert_eq!(layout.margins.top_margin, Some(1.0));
    assert_eq!(layout.margins.left_margin, Some(0.75));
    assert_eq!(layout.margins.header_distance, Some(0.5));
    assert_eq!(layout.margins.footer_distance, Some(0.5));

    let paragraphs = package.read_paragraphs().expect("read paragraphs");
    assert_eq!(paragraphs.len(), 1);
}

#[test]
fn page_layout_is_empty_without_section_properties() {
    let bytes = docx_bytes(&[("word/document.xml", document("<w:p/>"))]);
    let package = DocxPackage::from_bytes(bytes, "fixture.docx").expect("open fixture");

    assert_eq!(package.read_page_layout().expect("read layout"), PageLayout::default());
    assert!(package.read_comments().expect("read comments").is_empty());
}

#[test]
fn comments_keep_metadata_and_join_paragraphs() {
    let comments = format!(
        r#"<w:comments {W_NS}>
<w:comment w:id="0" w:author="Reviewer" w:date="2025-07-15T10:00:00Z" w:initials="RV">
  <w:p><w:r><w:t>Confirm conduit size.</w:t></w:r></w:p>
  <w:p><w:r><w:t>See drawing E-101.</w:t></w:r></w:p>
</w:comment>
<w:comment w:id="1" w:author=""><w:p/></w:comment>
</w:comments>"#
    );
    let bytes = docx_bytes(&[
        ("word/document.xml", document("<w:p/>")),
        ("word/comments.xml", comments),
    ]);
    let package = DocxPackage::from_bytes(bytes, "fixture.docx").expect("open fixture");

    let comments = package.read_comments().expect("read comments");
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].comment_id.as_deref(), Some("0"));
    assert_eq!(comments[0].author.as_deref(), Some("Reviewer"));
    assert_eq!(comments[0].initials.as_deref(), Some("RV"));
    assert_eq!(comments[0].timestamp.as_deref(), Some("2025-07-15T10:00:00Z"));
    assert_eq!(comments[0].text, "Confirm conduit size.\nSee drawing E-101.");
    assert_eq!(comments[1].author, None);
    assert_eq!(comments[1].text, "");
}

#[test]
fn plain_text_source_yields_one_paragraph_per_line() {
    let source = PlainTextSource::from_text("SECTION 26 05 00\n\n1.0 GENERAL\r\n");
    let paragraphs = source.read_paragraphs().expect("read text");

    let texts = paragraphs
        .iter()
        .map(|paragraph| paragraph.text.as_str())
        .collect::<Vec<_>>();
    assert_eq!(texts, vec!["SECTION 26 05 00", "", "1.0 GENERAL"]);
    assert!(paragraphs.iter().all(|paragraph| paragraph.list_id.is_none()));
    assert!(source.read_numbering_definitions().expect("numbering").is_empty());
    assert_eq!(source.read_page_layout().expect("layout"), PageLayout::default());
}

#[test]
fn writer_emits_style_numbering_and_highlight() {
    let descriptor = StyleDescriptor {
        level_type: LevelType::List,
        style_id: "BWAList".to_string(),
        style_name: "BWA-List".to_string(),
        numbering_id: Some("3".to_string()),
        abstract_num_id: Some("10".to_string()),
        list_level_index: Some(1),
        indentation: Indentation {
            left: Some(1080),
            hanging: Some(360),
            first_line: None,
        },
        justification: Some("both".to_string()),
        suffix: Some("tab".to_string()),
        number_format: Some(NumberFormat::Decimal),
        level_text: Some("%2.".to_string()),
        used_fallback_styling: false,
    };

    let mut writer = DocxWriter::new();
    let handle = writer.write_paragraph("Provide <conduit>", "Normal");
    writer.apply(handle, &descriptor);
    writer.highlight(handle, Highlight::Cyan);
    let second = writer.write_paragraph("2.01\tMATERIALS", "Normal");
    writer.apply(
        second,
        &StyleDescriptor {
            used_fallback_styling: true,
            numbering_id: None,
            list_level_index: None,
            indentation: Indentation::default(),
            justification: None,
            style_id: "Normal".to_string(),
            ..descriptor.clone()
        },
    );

    let xml = writer.document_xml();
    assert_eq!(writer.paragraph_count(), 2);
    assert!(xml.contains(r#"<w:pStyle w:val="BWAList"/>"#));
    assert!(xml.contains(r#"<w:numPr><w:ilvl w:val="1"/><w:numId w:val="3"/></w:numPr>"#));
    assert!(xml.contains(r#"<w:ind w:left="1080" w:hanging="360"/>"#));
    assert!(xml.contains(r#"<w:jc w:val="both"/>"#));
    assert!(xml.contains(r#"<w:highlight w:val="cyan"/>"#));
    assert!(xml.contains("Provide &lt;conduit&gt;"));
    assert!(xml.contains(r#"<w:highlight w:val="yellow"/>"#));
    assert!(xml.contains("<w:tab/>"));
}

#[test]
fn written_package_reads_back() {
    let template_bytes = docx_bytes(&[
        ("word/document.xml", document("")),
        ("word/styles.xml", styles()),
        ("word/numbering.xml", numbering()),
    ]);
    let template = DocxPackage::from_bytes(template_bytes, "template.docx").expect("open template");

    let mut writer = DocxWriter::with_template(&template);
    writer.write_paragraph("1.0\tGENERAL", "Normal");
    writer.write_paragraph("Provide materials", "BWAList");
    let bytes = writer.to_bytes().expect("write package");

    let reread = DocxPackage::from_bytes(bytes, "processed.docx").expect("reopen package");
    let paragraphs = reread.read_paragraphs().expect("read paragraphs");
    assert_eq!(paragraphs.len(), 2);
    assert_eq!(paragraphs[0].text, "1.0\tGENERAL");
    assert_eq!(paragraphs[1].style_id.as_deref(), Some("BWAList"));
    assert_eq!(paragraphs[1].list_id.as_deref(), Some("3"));
    assert_eq!(reread.styles_xml(), template.styles_xml());
    assert!(reread.numbering_xml().is_some());
}

#[test]
fn open_source_rejects_unknown_extensions() {
    let error = open_source(std::path::Path::new("notes.pdf"))
        .err()
        .expect("unsupported extension");
    assert!(error.to_string().contains("unsupported document type"));
}
