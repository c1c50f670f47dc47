use anyhow::{Result, anyhow};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

use super::numbering::Indentation;
use super::xml::{attr_string, attr_u32, read_indentation};

const MAX_BASED_ON_DEPTH: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDefinition {
    pub style_id: String,
    pub name: Option<String>,
    pub style_type: Option<String>,
    pub based_on: Option<String>,
    pub num_id: Option<String>,
    pub ilvl: Option<u8>,
    pub justification: Option<String>,
    pub indentation: Indentation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleTable {
    pub styles: Vec<StyleDefinition>,
}

impl StyleTable {
    pub fn by_id(&self, style_id: &str) -> Option<&StyleDefinition> {
        self.styles.iter().find(|style| style.style_id == style_id)
    }

    pub fn by_name(&self, name: &str) -> Option<&StyleDefinition> {
        let wanted = name.trim();
        self.styles
            .iter()
            .find(|style| {
                style
                    .name
                    .as_deref()
                    .is_some_and(|style_name| style_name.eq_ignore_ascii_case(wanted))
            })
            .or_else(|| {
                self.styles
                    .iter()
                    .find(|style| style.style_id.eq_ignore_ascii_case(wanted))
            })
    }

    pub fn numbering_for(&self, style_id: &str) -> Option<(String, u8)> {
        let mut current = self.by_id(style_id);
        let mut ilvl = None;
        for _ in 0..MAX_BASED_ON_DEPTH {
            let style = current?;
            ilvl = ilvl.or(style.ilvl);
            if let Some(num_id) = style.num_id.as_deref() {
                if num_id == "0" {
                    return None;
                }
                return Some((num_id.to_string(), ilvl.unwrap_or(0)));
            }
            current = style.based_on.as_deref().and_then(|parent| self.by_id(parent));
        }

        None
    }
}

pub fn parse_styles_xml(xml: &str) -> Result<StyleTable> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut table = StyleTable::default();
    let mut current: Option<StyleDefinition> = None;
    let mut in_run_properties = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:rPr" => in_run_properties = true,
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:style" => {
                    current = attr_string(e, b"w:styleId").map(|style_id| StyleDefinition {
                        style_id,
                        style_type: attr_string(e, b"w:type"),
                        ..StyleDefinition::default()
                    });
                }
                tag => {
                    if let Some(style) = current.as_mut() {
                        match tag {
                            b"w:name" => style.name = attr_string(e, b"w:val"),
                            b"w:basedOn" => style.based_on = attr_string(e, b"w:val"),
                            b"w:numId" => style.num_id = attr_string(e, b"w:val"),
                            b"w:ilvl" => {
                                style.ilvl = attr_u32(e, b"w:val").and_then(|value| u8::try_from(value).ok());
                            }
                            b"w:jc" if !in_run_properties => style.justification = attr_string(e, b"w:val"),
                            b"w:ind" if !in_run_properties => style.indentation = read_indentation(e),
                            _ => {}
                        }
                    }
                }
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:style" => {
                    if let Some(style) = current.take() {
                        table.styles.push(style);
                    }
                }
                b"w:rPr" => in_run_properties = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(anyhow!("failed to parse styles.xml: {err}")),
            _ => {}
        }

        buf.clear();
    }

    Ok(table)
}
