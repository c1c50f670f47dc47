use serde::{Deserialize, Serialize};

use super::classify::{LevelType, NumberOrigin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Original,
    Reconstructed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub line_number: usize,
    pub level_type: LevelType,
    pub number: String,
    pub text: String,
    pub source_text: String,
    pub provenance: Provenance,
    pub number_origin: NumberOrigin,
}

impl Entry {
    pub fn synthetic(level_type: LevelType, number: String, line_number: usize) -> Self {
        Self {
            line_number,
            level_type,
            number,
            text: String::new(),
            source_text: String::new(),
            provenance: Provenance::Reconstructed,
            number_origin: NumberOrigin::Reconstructed,
        }
    }

    pub fn is_reconstructed(&self) -> bool {
        self.provenance == Provenance::Reconstructed
    }

    pub fn is_synthetic_parent(&self) -> bool {
        self.is_reconstructed() && self.text.is_empty()
    }

    pub fn append_text(&mut self, extra: &str) {
        let extra = extra.trim();
        if extra.is_empty() {
            return;
        }
        if self.text.is_empty() {
            self.text = extra.to_string();
        } else {
            self.text.push(' ');
            self.text.push_str(extra);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LooseParagraph {
    pub line_number: usize,
    pub text: String,
    pub source_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
    pub line_number: usize,
    pub number: Option<String>,
    pub text: String,
    pub source_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionHeader {
    pub section: Option<HeaderLine>,
    pub title: Option<HeaderLine>,
    pub end_of_section: Option<HeaderLine>,
}

impl SectionHeader {
    pub fn section_number(&self) -> Option<&str> {
        self.section.as_ref().and_then(|line| line.number.as_deref())
    }

    pub fn section_title(&self) -> Option<&str> {
        self.title.as_ref().map(|line| line.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubListNode {
    pub entry: Entry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNode {
    pub entry: Entry,
    pub sub_lists: Vec<SubListNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemNode {
    pub entry: Entry,
    pub lists: Vec<ListNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsectionNode {
    pub entry: Entry,
    pub notes: Vec<LooseParagraph>,
    pub items: Vec<ItemNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartNode {
    pub entry: Entry,
    pub notes: Vec<LooseParagraph>,
    pub subsections: Vec<SubsectionNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecTree {
    pub header: SectionHeader,
    pub front_matter: Vec<LooseParagraph>,
    pub parts: Vec<PartNode>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeCounts {
    pub parts: usize,
    pub subsections: usize,
    pub items: usize,
    pub lists: usize,
    pub sub_lists: usize,
    pub reconstructed: usize,
    pub loose_paragraphs: usize,
}

impl SpecTree {
    pub fn entries(&self) -> Vec<&Entry> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.push(&part.entry);
            for subsection in &part.subsections {
                out.push(&subsection.entry);
                for item in &subsection.items {
                    out.push(&item.entry);
                    for list in &item.lists {
                        out.push(&list.entry);
                        out.extend(list.sub_lists.iter().map(|sub_list| &sub_list.entry));
                    }
                }
            }
        }
        out
    }

    pub fn counts(&self) -> TreeCounts {
        let mut counts = TreeCounts {
            loose_paragraphs: self.front_matter.len(),
            ..TreeCounts::default()
        };

        for part in &self.parts {
            counts.loose_paragraphs += part.notes.len();
            for subsection in &part.subsections {
                counts.loose_paragraphs += subsection.notes.len();
            }
        }

        for entry in self.entries() {
            match entry.level_type {
                LevelType::Part | LevelType::PartTitle => counts.parts += 1,
                LevelType::Subsection | LevelType::SubsectionTitle => counts.subsections += 1,
                LevelType::Item => counts.items += 1,
                LevelType::List => counts.lists += 1,
                LevelType::SubList => counts.sub_lists += 1,
                _ => {}
            }
            if entry.is_reconstructed() {
                counts.reconstructed += 1;
            }
        }

        counts
    }
}
