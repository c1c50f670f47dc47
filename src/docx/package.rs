use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, warn};
use zip::ZipArchive;

use super::comments::{DocumentComment, parse_comments_xml};
use super::layout::{
    HeaderFooterContent, PageLayout, parse_header_footer_xml, parse_relationships,
    parse_section_properties,
};
use super::numbering::{NumberingTable, parse_numbering_xml};
use super::styles::{StyleTable, parse_styles_xml};
use super::xml::{attr_string, attr_u32};
use super::{DocumentSource, Paragraph};

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const NUMBERING_PART: &str = "word/numbering.xml";
pub const STYLES_PART: &str = "word/styles.xml";
pub const COMMENTS_PART: &str = "word/comments.xml";
pub const RELATIONSHIPS_PART: &str = "word/_rels/document.xml.rels";

#[derive(Debug, Clone)]
pub struct DocxPackage {
    label: String,
    document_xml: String,
    numbering_xml: Option<String>,
    styles_xml: Option<String>,
    relationships_xml: Option<String>,
    comments_xml: Option<String>,
    header_footer_parts: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct ParagraphDraft {
    text: String,
    style_id: Option<String>,
    num_id: Option<String>,
    ilvl: Option<u8>,
}

impl DocxPackage {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open document: {}", path.display()))?;
        Self::from_reader(file, &path.display().to_string())
            .with_context(|| format!("failed to read docx package: {}", path.display()))
    }

    pub fn from_bytes(bytes: Vec<u8>, label: &str) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes), label)
    }

    fn from_reader<R: Read + Seek>(reader: R, label: &str) -> Result<Self> {
        let mut archive = ZipArchive::new(reader).context("file is not a zip container")?;

        let document_xml = read_part(&mut archive, DOCUMENT_PART)?
            .ok_or_else(|| anyhow!("package has no {DOCUMENT_PART} part"))?;
        let numbering_xml = read_part(&mut archive, NUMBERING_PART)?;
        let styles_xml = read_part(&mut archive, STYLES_PART)?;
        let relationships_xml = read_part(&mut archive, RELATIONSHIPS_PART)?;
        let comments_xml = read_part(&mut archive, COMMENTS_PART)?;

        let names = archive
            .file_names()
            .filter(|name| is_header_footer_part(name))
            .map(str::to_string)
            .collect::<Vec<_>>();
        let mut header_footer_parts = BTreeMap::new();
        for name in names {
            if let Some(xml) = read_part(&mut archive, &name)? {
                header_footer_parts.insert(name, xml);
            }
        }

        Ok(Self {
            label: label.to_string(),
            document_xml,
            numbering_xml,
            styles_xml,
            relationships_xml,
            comments_xml,
            header_footer_parts,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn numbering_xml(&self) -> Option<&str> {
        self.numbering_xml.as_deref()
    }

    pub fn styles_xml(&self) -> Option<&str> {
        self.styles_xml.as_deref()
    }

    fn header_footer_content(
        &self,
        relationship_id: Option<&str>,
        relationships: &HashMap<String, String>,
    ) -> Result<HeaderFooterContent> {
        let Some(part) = relationship_id.and_then(|id| relationships.get(id)) else {
            return Ok(HeaderFooterContent::default());
        };
        let Some(xml) = self.header_footer_parts.get(part) else {
            warn!(source = %self.label, part = %part, "referenced header or footer part is missing");
            return Ok(HeaderFooterContent::default());
        };

        parse_header_footer_xml(xml).with_context(|| format!("invalid package part {part}"))
    }

    fn parse_body(&self) -> Result<(Vec<ParagraphDraft>, usize)> {
        let mut reader = Reader::from_str(&self.document_xml);
        reader.trim_text(false);

        let mut drafts = Vec::new();
        let mut current: Option<ParagraphDraft> = None;
        let mut table_depth = 0usize;
        let mut table_paragraphs = 0usize;
        let mut in_text = false;
        let mut in_paragraph_properties = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"w:tbl" => table_depth += 1,
                    b"w:p" => {
                        if table_depth > 0 {
                            table_paragraphs += 1;
                        } else {
                            current = Some(ParagraphDraft::default());
                        }
                    }
                    b"w:pPr" => in_paragraph_properties = true,
                    b"w:t" => in_text = current.is_some(),
                    tag => apply_marker(current.as_mut(), tag, e, in_paragraph_properties),
                },
                Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                    b"w:p" => {
                        if table_depth > 0 {
                            table_paragraphs += 1;
                        } else {
                            drafts.push(ParagraphDraft::default());
                        }
                    }
                    tag => apply_marker(current.as_mut(), tag, e, in_paragraph_properties),
                },
                Ok(Event::Text(ref e)) => {
                    if in_text {
                        if let Some(draft) = current.as_mut() {
                            let text = e
                                .unescape()
                                .map_err(|err| anyhow!("failed to decode paragraph text: {err}"))?;
                            draft.text.push_str(&text);
                        }
                    }
                }
                Ok(Event::End(ref e)) => match e.name().as_ref() {
                    b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                    b"w:p" => {
                        if let Some(draft) = current.take() {
                            drafts.push(draft);
                        }
                    }
                    b"w:pPr" => in_paragraph_properties = false,
                    b"w:t" => in_text = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(err) => bail!("failed to parse {DOCUMENT_PART}: {err}"),
                _ => {}
            }

            buf.clear();
        }

        Ok((drafts, table_paragraphs))
    }
}

fn apply_marker(
    draft: Option<&mut ParagraphDraft>,
    tag: &[u8],
    e: &quick_xml::events::BytesStart<'_>,
    in_paragraph_properties: bool,
) {
    let Some(draft) = draft else {
        return;
    };

    match tag {
        b"w:tab" if !in_paragraph_properties => draft.text.push('\t'),
        b"w:br" | b"w:cr" => draft.text.push(' '),
        b"w:pStyle" => draft.style_id = attr_string(e, b"w:val"),
        b"w:numId" if in_paragraph_properties => draft.num_id = attr_string(e, b"w:val"),
        b"w:ilvl" if in_paragraph_properties => {
            draft.ilvl = attr_u32(e, b"w:val").and_then(|value| u8::try_from(value).ok());
        }
        _ => {}
    }
}

fn is_header_footer_part(name: &str) -> bool {
    name.strip_prefix("word/")
        .is_some_and(|rest| {
            !rest.contains('/')
                && rest.ends_with(".xml")
                && (rest.starts_with("header") || rest.starts_with("footer"))
        })
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let Ok(mut part) = archive.by_name(name) else {
        return Ok(None);
    };

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .with_context(|| format!("failed to read package part {name}"))?;
    Ok(Some(xml))
}

impl DocumentSource for DocxPackage {
    fn read_paragraphs(&self) -> Result<Vec<Paragraph>> {
        let (drafts, table_paragraphs) = self.parse_body()?;
        if table_paragraphs > 0 {
            warn!(
                source = %self.label,
                skipped = table_paragraphs,
                "skipped paragraphs inside tables"
            );
        }

        let styles = self.read_styles()?;
        let paragraphs = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                let numbering = match draft.num_id.as_deref() {
                    Some("0") => None,
                    Some(num_id) => Some((num_id.to_string(), draft.ilvl.unwrap_or(0))),
                    None => draft
                        .style_id
                        .as_deref()
                        .and_then(|style_id| styles.numbering_for(style_id)),
                };

                Paragraph {
                    index,
                    text: draft.text,
                    list_id: numbering.as_ref().map(|(num_id, _)| num_id.clone()),
                    list_level: numbering.as_ref().map(|(_, ilvl)| *ilvl),
                    style_id: draft.style_id,
                }
            })
            .collect::<Vec<_>>();

        debug!(source = %self.label, paragraphs = paragraphs.len(), "read docx paragraphs");
        Ok(paragraphs)
    }

    fn read_numbering_definitions(&self) -> Result<NumberingTable> {
        match self.numbering_xml.as_deref() {
            Some(xml) => parse_numbering_xml(xml)
                .with_context(|| format!("invalid numbering definitions in {}", self.label)),
            None => Ok(NumberingTable::default()),
        }
    }

    fn read_styles(&self) -> Result<StyleTable> {
        match self.styles_xml.as_deref() {
            Some(xml) => {
                parse_styles_xml(xml).with_context(|| format!("invalid styles in {}", self.label))
            }
            None => Ok(StyleTable::default()),
        }
    }

    fn read_page_layout(&self) -> Result<PageLayout> {
        let section = parse_section_properties(&self.document_xml)
            .with_context(|| format!("invalid section properties in {}", self.label))?;
        let relationships = match self.relationships_xml.as_deref() {
            Some(xml) => parse_relationships(xml)
                .with_context(|| format!("invalid document relationships in {}", self.label))?,
            None => HashMap::new(),
        };

        Ok(PageLayout {
            header: self.header_footer_content(section.header_ref.as_deref(), &relationships)?,
            footer: self.header_footer_content(section.footer_ref.as_deref(), &relationships)?,
            margins: section.margins(),
        })
    }

    fn read_comments(&self) -> Result<Vec<DocumentComment>> {
        match self.comments_xml.as_deref() {
            Some(xml) => parse_comments_xml(xml)
                .with_context(|| format!("invalid comments in {}", self.label)),
            None => Ok(Vec::new()),
        }
    }
}
