use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

use super::xml::{attr_string, attr_u32, read_indentation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    Decimal,
    DecimalZero,
    UpperLetter,
    LowerLetter,
    UpperRoman,
    LowerRoman,
    #[default]
    Bullet,
    None,
}

impl NumberFormat {
    pub fn parse(value: &str) -> Self {
        match value {
            "decimal" => Self::Decimal,
            "decimalZero" => Self::DecimalZero,
            "upperLetter" => Self::UpperLetter,
            "lowerLetter" => Self::LowerLetter,
            "upperRoman" => Self::UpperRoman,
            "lowerRoman" => Self::LowerRoman,
            "none" => Self::None,
            _ => Self::Bullet,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decimal => "decimal",
            Self::DecimalZero => "decimalZero",
            Self::UpperLetter => "upperLetter",
            Self::LowerLetter => "lowerLetter",
            Self::UpperRoman => "upperRoman",
            Self::LowerRoman => "lowerRoman",
            Self::Bullet => "bullet",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indentation {
    pub left: Option<i32>,
    pub hanging: Option<i32>,
    pub first_line: Option<i32>,
}

impl Indentation {
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.hanging.is_none() && self.first_line.is_none()
    }

    pub fn or(self, other: Indentation) -> Indentation {
        if self.is_empty() { other } else { self }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingLevel {
    pub ilvl: u8,
    pub start: u32,
    pub num_fmt: NumberFormat,
    pub lvl_text: Option<String>,
    pub justification: Option<String>,
    pub suffix: Option<String>,
    pub p_style: Option<String>,
    pub indentation: Indentation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractNumbering {
    pub abstract_num_id: String,
    pub levels: BTreeMap<u8, NumberingLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingTable {
    pub nums: BTreeMap<String, String>,
    pub abstracts: BTreeMap<String, AbstractNumbering>,
}

impl NumberingTable {
    pub fn is_empty(&self) -> bool {
        self.nums.is_empty() && self.abstracts.is_empty()
    }

    pub fn abstract_id(&self, num_id: &str) -> Option<&str> {
        self.nums.get(num_id).map(String::as_str)
    }

    pub fn level(&self, num_id: &str, ilvl: u8) -> Option<&NumberingLevel> {
        let abstract_id = self.abstract_id(num_id)?;
        self.abstracts.get(abstract_id)?.levels.get(&ilvl)
    }

    pub fn level_format(&self, num_id: &str, ilvl: u8) -> Option<NumberFormat> {
        self.level(num_id, ilvl).map(|level| level.num_fmt)
    }

    pub fn level_for_style(&self, style_id: &str) -> Option<(String, &AbstractNumbering, &NumberingLevel)> {
        for numbering in self.abstracts.values() {
            let Some(level) = numbering
                .levels
                .values()
                .find(|level| level.p_style.as_deref() == Some(style_id))
            else {
                continue;
            };

            let Some(num_id) = self
                .nums
                .iter()
                .find(|(_, abstract_id)| **abstract_id == numbering.abstract_num_id)
                .map(|(num_id, _)| num_id.clone())
            else {
                continue;
            };
            return Some((num_id, numbering, level));
        }

        None
    }
}

pub fn parse_numbering_xml(xml: &str) -> Result<NumberingTable> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut table = NumberingTable::default();
    let mut current_abstract: Option<AbstractNumbering> = None;
    let mut current_level: Option<NumberingLevel> = None;
    let mut current_num_id: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:abstractNum" => {
                    current_abstract = attr_string(e, b"w:abstractNumId").map(|abstract_num_id| {
                        AbstractNumbering {
                            abstract_num_id,
                            levels: BTreeMap::new(),
                        }
                    });
                }
                b"w:num" => current_num_id = attr_string(e, b"w:numId"),
                b"w:abstractNumId" => {
                    if let (Some(num_id), Some(abstract_id)) =
                        (current_num_id.clone(), attr_string(e, b"w:val"))
                    {
                        table.nums.insert(num_id, abstract_id);
                    }
                }
                b"w:lvl" => {
                    if current_abstract.is_some() {
                        let ilvl = attr_u32(e, b"w:ilvl").unwrap_or(0);
                        current_level = Some(NumberingLevel {
                            ilvl: u8::try_from(ilvl).unwrap_or(u8::MAX),
                            start: 1,
                            ..NumberingLevel::default()
                        });
                    }
                }
                tag => {
                    if let Some(level) = current_level.as_mut() {
                        match tag {
                            b"w:start" => level.start = attr_u32(e, b"w:val").unwrap_or(1),
                            b"w:numFmt" => {
                                level.num_fmt = attr_string(e, b"w:val")
                                    .map(|value| NumberFormat::parse(&value))
                                    .unwrap_or_default();
                            }
                            b"w:lvlText" => level.lvl_text = attr_string(e, b"w:val"),
                            b"w:lvlJc" => level.justification = attr_string(e, b"w:val"),
                            b"w:suff" => level.suffix = attr_string(e, b"w:val"),
                            b"w:pStyle" => level.p_style = attr_string(e, b"w:val"),
                            b"w:ind" => level.indentation = read_indentation(e),
                            _ => {}
                        }
                    }
                }
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:lvl" => {
                    if let (Some(numbering), Some(level)) = (current_abstract.as_mut(), current_level.take()) {
                        numbering.levels.insert(level.ilvl, level);
                    }
                }
                b"w:abstractNum" => {
                    if let Some(numbering) = current_abstract.take() {
                        table
                            .abstracts
                            .insert(numbering.abstract_num_id.clone(), numbering);
                    }
                }
                b"w:num" => current_num_id = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(anyhow!("failed to parse numbering.xml: {err}")),
            _ => {}
        }

        buf.clear();
    }

    Ok(table)
}
