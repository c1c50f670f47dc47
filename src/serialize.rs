use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::structure::{
    Entry, ErrorLog, ErrorType, ExtractionError, HeaderLine, ItemNode, LevelType, ListNode,
    LooseParagraph, NumberOrigin, PartNode, Provenance, SpecTree, SubListNode, SubsectionNode,
    first_number, strip_numbering_prefix,
};
use crate::template::TemplateLevelMapping;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub text: String,
    pub level_type: LevelType,
    pub number: Option<String>,
    pub content: String,
    pub level_number: Option<u8>,
    pub bwa_level_name: Option<String>,
    pub style_name: String,
    pub numbering_id: Option<String>,
    pub numbering_level: Option<u8>,
    pub line_number: usize,
    pub reconstructed: bool,
    pub number_origin: Option<NumberOrigin>,
    pub used_fallback_styling: bool,
}

#[derive(Debug, Default)]
pub struct Serialized {
    pub blocks: Vec<ContentBlock>,
    pub mapping_errors: ErrorLog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    line_number: usize,
    level_type: LevelType,
    number: Option<String>,
    content: String,
    source_text: String,
    reconstructed: bool,
    number_origin: Option<NumberOrigin>,
}

impl Row {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            line_number: entry.line_number,
            level_type: entry.level_type,
            number: Some(entry.number.clone()).filter(|number| !number.is_empty()),
            content: clean_text_for_display(&entry.text),
            source_text: entry.source_text.clone(),
            reconstructed: entry.is_reconstructed(),
            number_origin: Some(entry.number_origin),
        }
    }

    fn from_header(level_type: LevelType, line: &HeaderLine) -> Self {
        Self {
            line_number: line.line_number,
            level_type,
            number: line.number.clone(),
            content: clean_text_for_display(&line.text),
            source_text: line.source_text.clone(),
            reconstructed: false,
            number_origin: None,
        }
    }

    fn from_loose(paragraph: &LooseParagraph) -> Self {
        Self {
            line_number: paragraph.line_number,
            level_type: LevelType::Content,
            number: None,
            content: clean_text_for_display(&paragraph.text),
            source_text: paragraph.source_text.clone(),
            reconstructed: false,
            number_origin: None,
        }
    }

    fn display_text(&self) -> String {
        if !self.source_text.trim().is_empty() {
            return self.source_text.clone();
        }

        match self.number.as_deref() {
            Some(number) if self.content.is_empty() => number.to_string(),
            Some(number) => format!("{number}\t{}", self.content),
            None => self.content.clone(),
        }
    }
}

fn document_rows(tree: &SpecTree) -> Vec<Row> {
    let mut rows = Vec::new();
    if let Some(section) = &tree.header.section {
        rows.push(Row::from_header(LevelType::Section, section));
    }
    if let Some(title) = &tree.header.title {
        rows.push(Row::from_header(LevelType::Title, title));
    }
    rows.extend(tree.front_matter.iter().map(Row::from_loose));

    for part in &tree.parts {
        rows.push(Row::from_entry(&part.entry));
        rows.extend(part.notes.iter().map(Row::from_loose));
        for subsection in &part.subsections {
            rows.push(Row::from_entry(&subsection.entry));
            rows.extend(subsection.notes.iter().map(Row::from_loose));
            for item in &subsection.items {
                rows.push(Row::from_entry(&item.entry));
                for list in &item.lists {
                    rows.push(Row::from_entry(&list.entry));
                    rows.extend(list.sub_lists.iter().map(|sub_list| Row::from_entry(&sub_list.entry)));
                }
            }
        }
    }

    if let Some(end) = &tree.header.end_of_section {
        rows.push(Row::from_header(LevelType::EndOfSection, end));
    }
    rows
}

pub fn serialize_tree(tree: &SpecTree, mapping: &TemplateLevelMapping) -> Serialized {
    let mut blocks = Vec::new();
    let mut fallback_by_level: BTreeMap<LevelType, (usize, usize)> = BTreeMap::new();

    for row in document_rows(tree) {
        let descriptor = mapping.resolve(row.level_type);
        if descriptor.used_fallback_styling {
            let slot = fallback_by_level
                .entry(row.level_type)
                .or_insert((row.line_number, 0));
            slot.1 += 1;
        }

        blocks.push(ContentBlock {
            text: row.display_text(),
            level_type: row.level_type,
            number: row.number,
            content: row.content,
            level_number: row.level_type.level_number(),
            bwa_level_name: (!descriptor.used_fallback_styling && row.level_type != LevelType::Content)
                .then(|| descriptor.style_name.clone()),
            style_name: descriptor.style_name,
            numbering_id: descriptor.numbering_id,
            numbering_level: descriptor.list_level_index,
            line_number: row.line_number,
            reconstructed: row.reconstructed,
            number_origin: row.number_origin,
            used_fallback_styling: descriptor.used_fallback_styling,
        });
    }

    let mut mapping_errors = ErrorLog::new();
    for (level_type, (first_line, count)) in fallback_by_level {
        let fallback = mapping.resolve(level_type);
        mapping_errors.push(ExtractionError::new(
            first_line,
            ErrorType::TemplateMappingError,
            format!(
                "No template style found for level '{}'; {count} block(s) use fallback style '{}'",
                level_type.as_str(),
                fallback.style_name
            ),
            level_type.as_str(),
        ));
    }

    Serialized {
        blocks,
        mapping_errors,
    }
}

pub fn rebuild_tree(blocks: &[ContentBlock]) -> SpecTree {
    let mut tree = SpecTree::default();

    for block in blocks {
        match block.level_type {
            LevelType::Section => tree.header.section = Some(header_line(block)),
            LevelType::Title => tree.header.title = Some(header_line(block)),
            LevelType::EndOfSection => tree.header.end_of_section = Some(header_line(block)),
            LevelType::Empty => {}
            LevelType::Content => {
                let loose = LooseParagraph {
                    line_number: block.line_number,
                    text: block.content.clone(),
                    source_text: block.text.clone(),
                };
                match tree.parts.last_mut() {
                    Some(part) => match part.subsections.last_mut() {
                        Some(subsection) => subsection.notes.push(loose),
                        None => part.notes.push(loose),
                    },
                    None => tree.front_matter.push(loose),
                }
            }
            LevelType::Part | LevelType::PartTitle => tree.parts.push(PartNode {
                entry: block_entry(block),
                notes: Vec::new(),
                subsections: Vec::new(),
            }),
            LevelType::Subsection | LevelType::SubsectionTitle => {
                last_part(&mut tree, block).subsections.push(SubsectionNode {
                    entry: block_entry(block),
                    notes: Vec::new(),
                    items: Vec::new(),
                });
            }
            LevelType::Item => {
                last_subsection(&mut tree, block).items.push(ItemNode {
                    entry: block_entry(block),
                    lists: Vec::new(),
                });
            }
            LevelType::List => {
                last_item(&mut tree, block).lists.push(ListNode {
                    entry: block_entry(block),
                    sub_lists: Vec::new(),
                });
            }
            LevelType::SubList => {
                last_list(&mut tree, block).sub_lists.push(SubListNode {
                    entry: block_entry(block),
                });
            }
        }
    }

    tree
}

pub fn document_triples(tree: &SpecTree) -> Vec<(LevelType, Option<String>, String)> {
    document_rows(tree)
        .into_iter()
        .map(|row| (row.level_type, row.number, row.content))
        .collect()
}

pub fn clean_text_for_display(text: &str) -> String {
    let trimmed = text.trim();
    let mut cleaned = trimmed;

    loop {
        let without_section = strip_section_prefix(cleaned);
        let next = strip_numbering_prefix(without_section).unwrap_or(without_section);
        if next.len() == cleaned.len() {
            break;
        }
        cleaned = next;
    }

    if cleaned.trim().is_empty() {
        trimmed.to_string()
    } else {
        cleaned.trim().to_string()
    }
}

fn strip_section_prefix(text: &str) -> &str {
    let upper_prefix = text.get(..7).map(str::to_ascii_uppercase);
    if upper_prefix.as_deref() != Some("SECTION") {
        return text;
    }

    match text.split_once('\t') {
        Some((_, rest)) => rest.trim_start(),
        None => text,
    }
}

fn header_line(block: &ContentBlock) -> HeaderLine {
    HeaderLine {
        line_number: block.line_number,
        number: block.number.clone(),
        text: block.content.clone(),
        source_text: block.text.clone(),
    }
}

fn block_entry(block: &ContentBlock) -> Entry {
    let provenance = if block.reconstructed {
        Provenance::Reconstructed
    } else {
        Provenance::Original
    };

    Entry {
        line_number: block.line_number,
        level_type: block.level_type,
        number: block.number.clone().unwrap_or_default(),
        text: block.content.clone(),
        source_text: block.text.clone(),
        provenance,
        number_origin: block.number_origin.unwrap_or(NumberOrigin::Explicit),
    }
}

fn last_part<'a>(tree: &'a mut SpecTree, block: &ContentBlock) -> &'a mut PartNode {
    if tree.parts.is_empty() {
        tree.parts.push(PartNode {
            entry: Entry::synthetic(LevelType::Part, "1.0".to_string(), block.line_number),
            notes: Vec::new(),
            subsections: Vec::new(),
        });
    }
    let last = tree.parts.len() - 1;
    &mut tree.parts[last]
}

fn last_subsection<'a>(tree: &'a mut SpecTree, block: &ContentBlock) -> &'a mut SubsectionNode {
    let part = last_part(tree, block);
    if part.subsections.is_empty() {
        let number = first_number(LevelType::Subsection, Some(&part.entry.number))
            .unwrap_or_else(|| "1.01".to_string());
        part.subsections.push(SubsectionNode {
            entry: Entry::synthetic(LevelType::Subsection, number, block.line_number),
            notes: Vec::new(),
            items: Vec::new(),
        });
    }
    let last = part.subsections.len() - 1;
    &mut part.subsections[last]
}

fn last_item<'a>(tree: &'a mut SpecTree, block: &ContentBlock) -> &'a mut ItemNode {
    let subsection = last_subsection(tree, block);
    if subsection.items.is_empty() {
        subsection.items.push(ItemNode {
            entry: Entry::synthetic(LevelType::Item, "A".to_string(), block.line_number),
            lists: Vec::new(),
        });
    }
    let last = subsection.items.len() - 1;
    &mut subsection.items[last]
}

fn last_list<'a>(tree: &'a mut SpecTree, block: &ContentBlock) -> &'a mut ListNode {
    let item = last_item(tree, block);
    if item.lists.is_empty() {
        item.lists.push(ListNode {
            entry: Entry::synthetic(LevelType::List, "1".to_string(), block.line_number),
            sub_lists: Vec::new(),
        });
    }
    let last = item.lists.len() - 1;
    &mut item.lists[last]
}
