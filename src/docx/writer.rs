use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{Context, Result};
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::template::StyleDescriptor;

use super::numbering::Indentation;
use super::package::{DOCUMENT_PART, DocxPackage, NUMBERING_PART, STYLES_PART};
use super::xml::escape_text;
use super::{DocumentSink, Highlight, ParagraphHandle, StyleApplier};
use crate::util::ensure_directory;

const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const RELATIONSHIP_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const STYLES_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const NUMBERING_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct WrittenParagraph {
    text: String,
    style_id: String,
    numbering: Option<(String, u8)>,
    indentation: Indentation,
    justification: Option<String>,
    highlight: Option<Highlight>,
}

#[derive(Debug, Clone, Default)]
pub struct DocxWriter {
    paragraphs: Vec<WrittenParagraph>,
    styles_xml: Option<String>,
    numbering_xml: Option<String>,
}

impl DocxWriter {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(template: &DocxPackage) -> Self {
        Self {
            paragraphs: Vec::new(),
            styles_xml: template.styles_xml().map(str::to_string),
            numbering_xml: template.numbering_xml().map(str::to_string),
        }
    }

    #[cfg(test)]
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn document_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<w:document xmlns:w="{WORDPROCESSING_NS}"><w:body>"#));
        for paragraph in &self.paragraphs {
            xml.push_str(&paragraph_xml(paragraph));
        }
        xml.push_str("<w:sectPr/></w:body></w:document>");
        xml
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions<()> = FileOptions::default();

        let mut parts = vec![
            ("[Content_Types].xml".to_string(), self.content_types_xml()),
            ("_rels/.rels".to_string(), root_relationships_xml()),
            (DOCUMENT_PART.to_string(), self.document_xml()),
            (
                "word/_rels/document.xml.rels".to_string(),
                self.document_relationships_xml(),
            ),
        ];
        if let Some(styles) = &self.styles_xml {
            parts.push((STYLES_PART.to_string(), styles.clone()));
        }
        if let Some(numbering) = &self.numbering_xml {
            parts.push((NUMBERING_PART.to_string(), numbering.clone()));
        }

        for (name, body) in parts {
            zip.start_file(name.as_str(), options)
                .with_context(|| format!("failed to start package part {name}"))?;
            zip.write_all(body.as_bytes())
                .with_context(|| format!("failed to write package part {name}"))?;
        }

        let cursor = zip.finish().context("failed to finalize docx package")?;
        Ok(cursor.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            ensure_directory(parent)?;
        }

        let bytes = self.to_bytes()?;
        fs::write(path, bytes)
            .with_context(|| format!("failed to write docx file: {}", path.display()))
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        );
        if self.styles_xml.is_some() {
            xml.push_str(r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
        }
        if self.numbering_xml.is_some() {
            xml.push_str(r#"<Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>"#);
        }
        xml.push_str("</Types>");
        xml
    }

    fn document_relationships_xml(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{RELATIONSHIP_NS}">"#
        );
        if self.styles_xml.is_some() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId1" Type="{STYLES_REL}" Target="styles.xml"/>"#
            ));
        }
        if self.numbering_xml.is_some() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId2" Type="{NUMBERING_REL}" Target="numbering.xml"/>"#
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

fn root_relationships_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{RELATIONSHIP_NS}"><Relationship Id="rId1" Type="{OFFICE_DOCUMENT_REL}" Target="word/document.xml"/></Relationships>"#
    )
}

fn paragraph_xml(paragraph: &WrittenParagraph) -> String {
    let mut xml = String::from("<w:p><w:pPr>");
    xml.push_str(&format!(
        r#"<w:pStyle w:val="{}"/>"#,
        escape_text(&paragraph.style_id)
    ));

    if let Some((num_id, ilvl)) = &paragraph.numbering {
        xml.push_str(&format!(
            r#"<w:numPr><w:ilvl w:val="{ilvl}"/><w:numId w:val="{}"/></w:numPr>"#,
            escape_text(num_id)
        ));
    }

    if !paragraph.indentation.is_empty() {
        xml.push_str("<w:ind");
        if let Some(left) = paragraph.indentation.left {
            xml.push_str(&format!(r#" w:left="{left}""#));
        }
        if let Some(hanging) = paragraph.indentation.hanging {
            xml.push_str(&format!(r#" w:hanging="{hanging}""#));
        } else if let Some(first_line) = paragraph.indentation.first_line {
            xml.push_str(&format!(r#" w:firstLine="{first_line}""#));
        }
        xml.push_str("/>");
    }

    if let Some(justification) = &paragraph.justification {
        xml.push_str(&format!(r#"<w:jc w:val="{}"/>"#, escape_text(justification)));
    }
    xml.push_str("</w:pPr>");

    let run_properties = paragraph
        .highlight
        .map(|highlight| format!(r#"<w:rPr><w:highlight w:val="{}"/></w:rPr>"#, highlight.as_str()))
        .unwrap_or_default();

    for (position, segment) in paragraph.text.split('\t').enumerate() {
        xml.push_str("<w:r>");
        xml.push_str(&run_properties);
        if position > 0 {
            xml.push_str("<w:tab/>");
        }
        if !segment.is_empty() {
            xml.push_str(&format!(
                r#"<w:t xml:space="preserve">{}</w:t>"#,
                escape_text(segment)
            ));
        }
        xml.push_str("</w:r>");
    }

    xml.push_str("</w:p>");
    xml
}

impl DocumentSink for DocxWriter {
    fn write_paragraph(&mut self, text: &str, style_name: &str) -> ParagraphHandle {
        self.paragraphs.push(WrittenParagraph {
            text: text.to_string(),
            style_id: style_name.to_string(),
            ..WrittenParagraph::default()
        });
        ParagraphHandle(self.paragraphs.len() - 1)
    }
}

impl StyleApplier for DocxWriter {
    fn apply(&mut self, handle: ParagraphHandle, descriptor: &StyleDescriptor) {
        let Some(paragraph) = self.paragraphs.get_mut(handle.0) else {
            return;
        };

        paragraph.style_id = descriptor.style_id.clone();
        paragraph.numbering = descriptor
            .numbering_id
            .clone()
            .zip(descriptor.list_level_index);
        paragraph.indentation = descriptor.indentation;
        paragraph.justification = descriptor.justification.clone();
        if descriptor.used_fallback_styling {
            paragraph.highlight = Some(Highlight::Yellow);
        }
    }

    fn highlight(&mut self, handle: ParagraphHandle, highlight: Highlight) {
        if let Some(paragraph) = self.paragraphs.get_mut(handle.0) {
            paragraph.highlight = Some(highlight);
        }
    }
}
