use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};

use super::xml::{attr_i32, attr_string};

const TWIPS_PER_INCH: f64 = 1440.0;

/// Text of a header or footer part: paragraphs at any depth, tables as rows of
/// cell text, and text box paragraphs grouped per box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderFooterContent {
    pub paragraphs: Vec<String>,
    pub tables: Vec<Vec<Vec<String>>>,
    pub text_boxes: Vec<Vec<String>>,
}

/// Page margins of the first section, in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom_margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_distance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub header: HeaderFooterContent,
    pub footer: HeaderFooterContent,
    pub margins: PageMargins,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionProperties {
    pub margins_twips: [Option<i32>; 6],
    pub header_ref: Option<String>,
    pub footer_ref: Option<String>,
}

impl SectionProperties {
    pub fn margins(&self) -> PageMargins {
        let inches = |twips: Option<i32>| twips.map(|value| f64::from(value) / TWIPS_PER_INCH);
        let [top, bottom, left, right, header, footer] = self.margins_twips;
        PageMargins {
            top_margin: inches(top),
            bottom_margin: inches(bottom),
            left_margin: inches(left),
            right_margin: inches(right),
            header_distance: inches(header),
            footer_distance: inches(footer),
        }
    }
}

/// Reads the first `w:sectPr` of the body: page margins and the default header
/// and footer relationship ids.
pub fn parse_section_properties(document_xml: &str) -> Result<SectionProperties> {
    let mut reader = Reader::from_str(document_xml);
    let mut properties = SectionProperties::default();
    let mut in_section = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:sectPr" => in_section = true,
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if in_section => {
                apply_section_marker(&mut properties, e);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"w:sectPr" => break,
            Ok(Event::Eof) => break,
            Err(err) => bail!("failed to parse section properties: {err}"),
            _ => {}
        }
        buf.clear();
    }

    Ok(properties)
}

fn apply_section_marker(properties: &mut SectionProperties, e: &BytesStart<'_>) {
    let is_default = || {
        attr_string(e, b"w:type")
            .as_deref()
            .is_none_or(|kind| kind == "default")
    };

    match e.name().as_ref() {
        b"w:pgMar" => {
            properties.margins_twips = [
                attr_i32(e, b"w:top"),
                attr_i32(e, b"w:bottom"),
                attr_i32(e, b"w:left"),
                attr_i32(e, b"w:right"),
                attr_i32(e, b"w:header"),
                attr_i32(e, b"w:footer"),
            ];
        }
        b"w:headerReference" if is_default() => properties.header_ref = attr_string(e, b"r:id"),
        b"w:footerReference" if is_default() => properties.footer_ref = attr_string(e, b"r:id"),
        _ => {}
    }
}

/// Maps relationship ids of `word/_rels/document.xml.rels` to package part names.
pub fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr_string(e, b"Id"), attr_string(e, b"Target"))
                {
                    targets.insert(id, part_name(&target));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => bail!("failed to parse document relationships: {err}"),
            _ => {}
        }
        buf.clear();
    }

    Ok(targets)
}

fn part_name(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{target}"),
    }
}

pub fn parse_header_footer_xml(xml: &str) -> Result<HeaderFooterContent> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut content = HeaderFooterContent::default();
    // Slots keep paragraphs in opening order even when text boxes nest them.
    let mut paragraph_slots: Vec<String> = Vec::new();
    let mut open_paragraphs: Vec<usize> = Vec::new();
    let mut open_tables: Vec<Vec<Vec<String>>> = Vec::new();
    let mut open_rows: Vec<Vec<String>> = Vec::new();
    let mut open_cells: Vec<String> = Vec::new();
    let mut open_boxes: Vec<Vec<String>> = Vec::new();
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"w:p" => {
                    open_paragraphs.push(paragraph_slots.len());
                    paragraph_slots.push(String::new());
                }
                b"w:tbl" => open_tables.push(Vec::new()),
                b"w:tr" => open_rows.push(Vec::new()),
                b"w:tc" => open_cells.push(String::new()),
                b"w:txbxContent" => open_boxes.push(Vec::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|err| anyhow!("failed to decode header text: {err}"))?;
                for slot in &open_paragraphs {
                    paragraph_slots[*slot].push_str(&text);
                }
                for cell in &mut open_cells {
                    cell.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(slot) = open_paragraphs.pop() {
                        let text = paragraph_slots[slot].trim();
                        if let Some(text_box) = open_boxes.last_mut() {
                            if !text.is_empty() {
                                text_box.push(text.to_string());
                            }
                        }
                    }
                }
                b"w:tc" => {
                    if let Some(cell) = open_cells.pop() {
                        if let Some(row) = open_rows.last_mut() {
                            row.push(cell.trim().to_string());
                        }
                    }
                }
                b"w:tr" => {
                    if let Some(row) = open_rows.pop().filter(|row| !row.is_empty()) {
                        if let Some(table) = open_tables.last_mut() {
                            table.push(row);
                        }
                    }
                }
                b"w:tbl" => {
                    if let Some(table) = open_tables.pop().filter(|table| !table.is_empty()) {
                        content.tables.push(table);
                    }
                }
                b"w:txbxContent" => {
                    if let Some(text_box) = open_boxes.pop().filter(|text_box| !text_box.is_empty()) {
                        content.text_boxes.push(text_box);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => bail!("failed to parse header or footer part: {err}"),
            _ => {}
        }
        buf.clear();
    }

    content.paragraphs = paragraph_slots
        .into_iter()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    Ok(content)
}
