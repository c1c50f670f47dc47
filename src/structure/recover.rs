use std::ops::Range;

use crate::config::HeuristicThresholds;

use super::classify::{ClassifiedParagraph, LevelType, NumberOrigin};
use super::errors::{ErrorLog, ErrorType, ExtractionError};
use super::heuristics::{looks_like_item_content, looks_like_list_content, looks_like_subsection_title};
use super::numbering::{first_number, is_ahead_of, normalize, part_ordinal, subsection_parts, successor};
use super::tree::{
    Entry, HeaderLine, ItemNode, ListNode, LooseParagraph, PartNode, Provenance, SectionHeader,
    SpecTree, SubListNode, SubsectionNode,
};

#[derive(Debug, Default)]
pub struct Recovery {
    pub tree: SpecTree,
    pub errors: ErrorLog,
}

#[derive(Debug, Clone)]
struct Slot {
    line_number: usize,
    level_type: LevelType,
    number: Option<String>,
    text: String,
    source_text: String,
    number_origin: NumberOrigin,
}

impl Slot {
    fn from_paragraph(paragraph: &ClassifiedParagraph) -> Self {
        Self {
            line_number: paragraph.line_number,
            level_type: paragraph.level_type,
            number: paragraph.number.clone(),
            text: paragraph.content.clone(),
            source_text: paragraph.source_text.clone(),
            number_origin: paragraph.number_origin,
        }
    }

    fn to_entry(&self) -> Entry {
        let provenance = if self.number_origin == NumberOrigin::Reconstructed {
            Provenance::Reconstructed
        } else {
            Provenance::Original
        };

        Entry {
            line_number: self.line_number,
            level_type: self.level_type,
            number: self.number.clone().unwrap_or_default(),
            text: self.text.clone(),
            source_text: self.source_text.clone(),
            provenance,
            number_origin: self.number_origin,
        }
    }

    fn to_loose(&self) -> LooseParagraph {
        LooseParagraph {
            line_number: self.line_number,
            text: self.text.clone(),
            source_text: self.source_text.clone(),
        }
    }

    fn to_header_line(&self) -> HeaderLine {
        HeaderLine {
            line_number: self.line_number,
            number: self.number.clone(),
            text: self.text.clone(),
            source_text: self.source_text.clone(),
        }
    }
}

pub fn recover(paragraphs: &[ClassifiedParagraph], thresholds: &HeuristicThresholds) -> Recovery {
    let mut header = SectionHeader::default();
    let mut errors = ErrorLog::new();
    let mut slots = Vec::with_capacity(paragraphs.len());

    for paragraph in paragraphs {
        let slot = Slot::from_paragraph(paragraph);
        match paragraph.level_type {
            LevelType::Empty => {}
            LevelType::Section => header.section = Some(slot.to_header_line()),
            LevelType::Title => header.title = Some(slot.to_header_line()),
            LevelType::EndOfSection => {
                if header.end_of_section.is_some() {
                    errors.push(ExtractionError::new(
                        slot.line_number,
                        ErrorType::StructureError,
                        "Duplicate end of section marker found",
                        &slot.source_text,
                    ));
                } else {
                    header.end_of_section = Some(slot.to_header_line());
                }
            }
            _ => {
                if header.end_of_section.is_some() {
                    errors.push(ExtractionError::new(
                        slot.line_number,
                        ErrorType::ContentError,
                        "Content found after end of section marker",
                        &slot.source_text,
                    ));
                }
                slots.push(slot);
            }
        }
    }

    let mut recoverer = Recoverer {
        slots,
        thresholds,
        errors,
    };
    let (front_matter, parts) = recoverer.build_document();

    Recovery {
        tree: SpecTree {
            header,
            front_matter,
            parts,
        },
        errors: recoverer.errors,
    }
}

struct Recoverer<'a> {
    slots: Vec<Slot>,
    thresholds: &'a HeuristicThresholds,
    errors: ErrorLog,
}

impl Recoverer<'_> {
    fn build_document(&mut self) -> (Vec<LooseParagraph>, Vec<PartNode>) {
        let (leading, spans) = split_spans(&self.slots, 0..self.slots.len(), LevelType::is_part);
        let (notes_range, orphans) = self.split_leading(leading);
        let front_matter = self.loose_paragraphs(notes_range, "before the first part");

        let mut parts = Vec::with_capacity(spans.len() + 1);
        if let Some(orphans) = orphans {
            let entry = Entry::synthetic(
                LevelType::Part,
                "1.0".to_string(),
                self.slots[orphans.start].line_number,
            );
            parts.push(self.build_part(entry, orphans));
        }

        for span in spans {
            let entry = self.slots[span.start].to_entry();
            parts.push(self.build_part(entry, span.start + 1..span.end));
        }

        (front_matter, parts)
    }

    fn build_part(&mut self, entry: Entry, body: Range<usize>) -> PartNode {
        let part_number = entry.number.clone();
        self.assign_subsection_numbers(body.clone(), &part_number);
        self.fill_gaps(body.clone(), LevelType::Subsection, Some(&part_number));

        let (leading, spans) = split_spans(&self.slots, body, LevelType::is_subsection);
        let (notes_range, orphans) = self.split_leading(leading);
        let notes = self.loose_paragraphs(notes_range, "between a part heading and its first subsection");

        let mut subsections = Vec::with_capacity(spans.len() + 1);
        if let Some(orphans) = orphans {
            let number = first_number(LevelType::Subsection, Some(&part_number))
                .unwrap_or_else(|| "1.01".to_string());
            let entry = Entry::synthetic(
                LevelType::Subsection,
                number,
                self.slots[orphans.start].line_number,
            );
            subsections.push(self.build_subsection(entry, orphans));
        }

        for span in spans {
            let entry = self.slots[span.start].to_entry();
            subsections.push(self.build_subsection(entry, span.start + 1..span.end));
        }

        PartNode {
            entry,
            notes,
            subsections,
        }
    }

    fn build_subsection(&mut self, entry: Entry, body: Range<usize>) -> SubsectionNode {
        self.fill_gaps(body.clone(), LevelType::Item, None);

        let (leading, spans) = split_spans(&self.slots, body, |level_type| level_type == LevelType::Item);
        let (notes_range, orphans) = self.split_leading(leading);
        let notes = self.loose_paragraphs(notes_range, "between a subsection heading and its first item");

        let mut items = Vec::with_capacity(spans.len() + 1);
        if let Some(orphans) = orphans {
            let entry = Entry::synthetic(
                LevelType::Item,
                "A".to_string(),
                self.slots[orphans.start].line_number,
            );
            items.push(self.build_item(entry, orphans));
        }

        for span in spans {
            let entry = self.slots[span.start].to_entry();
            items.push(self.build_item(entry, span.start + 1..span.end));
        }

        SubsectionNode {
            entry,
            notes,
            items,
        }
    }

    fn build_item(&self, entry: Entry, body: Range<usize>) -> ItemNode {
        let mut item = ItemNode {
            entry,
            lists: Vec::new(),
        };
        let mut last_was_sub_list = false;

        for index in body.clone() {
            let slot = self.slots[index].clone();
            match slot.level_type {
                LevelType::List => {
                    item.lists.push(ListNode {
                        entry: slot.to_entry(),
                        sub_lists: Vec::new(),
                    });
                    last_was_sub_list = false;
                }
                LevelType::SubList => {
                    if item.lists.is_empty() {
                        item.lists.push(ListNode {
                            entry: Entry::synthetic(LevelType::List, "1".to_string(), slot.line_number),
                            sub_lists: Vec::new(),
                        });
                    }
                    if let Some(list) = item.lists.last_mut() {
                        list.sub_lists.push(SubListNode {
                            entry: slot.to_entry(),
                        });
                    }
                    last_was_sub_list = true;
                }
                _ => {
                    let remaining = index + 1..body.end;
                    match self.reconstruct_list_entry(&item, &slot, remaining, last_was_sub_list) {
                        Some(entry) if entry.level_type == LevelType::SubList => {
                            if let Some(list) = item.lists.last_mut() {
                                list.sub_lists.push(SubListNode { entry });
                            }
                        }
                        Some(entry) => {
                            item.lists.push(ListNode {
                                entry,
                                sub_lists: Vec::new(),
                            });
                        }
                        None => fold_into_latest(&mut item, &slot.text, last_was_sub_list),
                    }
                }
            }
        }

        item
    }

    fn reconstruct_list_entry(
        &self,
        item: &ItemNode,
        slot: &Slot,
        remaining: Range<usize>,
        last_was_sub_list: bool,
    ) -> Option<Entry> {
        if slot.level_type != LevelType::Content || !looks_like_list_content(&slot.text, self.thresholds) {
            return None;
        }

        let last_list = item.lists.last()?;
        let (level_type, expected) = if last_was_sub_list {
            let last_sub_list = last_list.sub_lists.last()?;
            (LevelType::SubList, successor(LevelType::SubList, &last_sub_list.entry.number)?)
        } else {
            (LevelType::List, successor(LevelType::List, &last_list.entry.number)?)
        };

        let claimed_later = self.slots[remaining]
            .iter()
            .take_while(|later| level_type == LevelType::List || later.level_type != LevelType::List)
            .any(|later| {
                later.level_type == level_type
                    && later
                        .number
                        .as_deref()
                        .is_some_and(|number| normalize(level_type, number) == expected)
            });
        if claimed_later {
            return None;
        }

        Some(Entry {
            line_number: slot.line_number,
            level_type,
            number: expected,
            text: slot.text.clone(),
            source_text: slot.source_text.clone(),
            provenance: Provenance::Reconstructed,
            number_origin: NumberOrigin::Reconstructed,
        })
    }

    fn assign_subsection_numbers(&mut self, body: Range<usize>, part_number: &str) {
        let mut previous: Option<String> = None;
        for slot in &mut self.slots[body] {
            if !slot.level_type.is_subsection() {
                continue;
            }

            if slot.number.is_none() {
                let assigned = match previous.as_deref() {
                    Some(previous) => successor(LevelType::Subsection, previous),
                    None => first_number(LevelType::Subsection, Some(part_number)),
                };
                slot.number = assigned;
                slot.number_origin = NumberOrigin::Assigned;
            }

            if slot.number.is_some() {
                previous = slot.number.clone();
            }
        }
    }

    fn fill_gaps(&mut self, body: Range<usize>, level_type: LevelType, parent: Option<&str>) {
        let Some(mut expected) = first_number(level_type, parent) else {
            return;
        };
        let parent_ordinal = parent.and_then(part_ordinal);
        let is_boundary = |candidate: LevelType| match level_type {
            LevelType::Subsection => candidate.is_subsection(),
            other => candidate == other,
        };

        let mut region_start = body.start;
        for index in body.clone() {
            if !is_boundary(self.slots[index].level_type) {
                continue;
            }

            let found = normalize(level_type, self.slots[index].number.as_deref().unwrap_or_default());

            if level_type == LevelType::Subsection {
                let found_part = subsection_parts(&found).map(|(part, _)| part);
                if parent_ordinal.is_some() && found_part != parent_ordinal {
                    region_start = index + 1;
                    continue;
                }
            }

            while found != expected && is_ahead_of(level_type, &expected, &found) {
                let Some(candidate) = (region_start..index).find(|&position| {
                    let slot = &self.slots[position];
                    slot.level_type == LevelType::Content && self.looks_like(level_type, &slot.text)
                }) else {
                    break;
                };

                let slot = &mut self.slots[candidate];
                slot.level_type = level_type;
                slot.number = Some(expected.clone());
                slot.number_origin = NumberOrigin::Reconstructed;
                region_start = candidate + 1;

                let Some(next) = successor(level_type, &expected) else {
                    break;
                };
                expected = next;
            }

            expected = successor(level_type, &found)
                .or_else(|| successor(level_type, &expected))
                .unwrap_or(expected);
            region_start = index + 1;
        }
    }

    fn looks_like(&self, level_type: LevelType, text: &str) -> bool {
        match level_type {
            LevelType::Subsection => looks_like_subsection_title(text, self.thresholds),
            LevelType::Item => looks_like_item_content(text, self.thresholds),
            _ => looks_like_list_content(text, self.thresholds),
        }
    }

    fn split_leading(&self, leading: Range<usize>) -> (Range<usize>, Option<Range<usize>>) {
        match leading
            .clone()
            .find(|&index| self.slots[index].level_type != LevelType::Content)
        {
            Some(first_structural) => (
                leading.start..first_structural,
                Some(first_structural..leading.end),
            ),
            None => (leading, None),
        }
    }

    fn loose_paragraphs(&mut self, range: Range<usize>, location: &str) -> Vec<LooseParagraph> {
        let mut notes = Vec::with_capacity(range.len());
        for slot in &self.slots[range] {
            self.errors.push(ExtractionError::new(
                slot.line_number,
                ErrorType::ContentWarning,
                format!("Standalone content found without item structure ({location})"),
                &slot.text,
            ));
            notes.push(slot.to_loose());
        }
        notes
    }
}

fn split_spans(
    slots: &[Slot],
    range: Range<usize>,
    is_boundary: impl Fn(LevelType) -> bool,
) -> (Range<usize>, Vec<Range<usize>>) {
    let starts = range
        .clone()
        .filter(|&index| is_boundary(slots[index].level_type))
        .collect::<Vec<_>>();

    let Some(&first) = starts.first() else {
        return (range, Vec::new());
    };

    let spans = starts
        .iter()
        .enumerate()
        .map(|(position, &start)| {
            let end = starts.get(position + 1).copied().unwrap_or(range.end);
            start..end
        })
        .collect();

    (range.start..first, spans)
}

fn fold_into_latest(item: &mut ItemNode, text: &str, last_was_sub_list: bool) {
    if let Some(list) = item.lists.last_mut() {
        if last_was_sub_list {
            if let Some(sub_list) = list.sub_lists.last_mut() {
                sub_list.entry.append_text(text);
                return;
            }
        }
        list.entry.append_text(text);
        return;
    }

    item.entry.append_text(text);
}
