use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{HeuristicThresholds, Vocabulary};
use crate::docx::{NumberFormat, NumberingTable, Paragraph};

use super::errors::{ErrorLog, ErrorType, ExtractionError};
use super::heuristics::{looks_like_subsection_title, starts_with_structural_keyword};
use super::numbering::{ListFix, ListNumberCorrector, NumberScheme, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelType {
    Section,
    Title,
    EndOfSection,
    Part,
    PartTitle,
    Subsection,
    SubsectionTitle,
    Item,
    List,
    SubList,
    Content,
    Empty,
}

impl LevelType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Title => "title",
            Self::EndOfSection => "end_of_section",
            Self::Part => "part",
            Self::PartTitle => "part_title",
            Self::Subsection => "subsection",
            Self::SubsectionTitle => "subsection_title",
            Self::Item => "item",
            Self::List => "list",
            Self::SubList => "sub_list",
            Self::Content => "content",
            Self::Empty => "empty",
        }
    }

    pub fn level_number(self) -> Option<u8> {
        match self {
            Self::Part | Self::PartTitle => Some(0),
            Self::Subsection | Self::SubsectionTitle => Some(1),
            Self::Item => Some(2),
            Self::List => Some(3),
            Self::SubList => Some(4),
            _ => None,
        }
    }

    pub fn is_part(self) -> bool {
        matches!(self, Self::Part | Self::PartTitle)
    }

    pub fn is_subsection(self) -> bool {
        matches!(self, Self::Subsection | Self::SubsectionTitle)
    }

    pub fn is_header(self) -> bool {
        matches!(self, Self::Section | Self::Title | Self::EndOfSection)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberOrigin {
    Explicit,
    Native,
    Assigned,
    Reconstructed,
}

impl NumberOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Native => "native",
            Self::Assigned => "assigned",
            Self::Reconstructed => "reconstructed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedParagraph {
    pub index: usize,
    pub line_number: usize,
    pub level_type: LevelType,
    pub number: Option<String>,
    pub content: String,
    pub source_text: String,
    pub number_origin: NumberOrigin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierState {
    pub section_header_seen: bool,
    pub section_title_seen: bool,
    pub parts_seen: usize,
}

#[derive(Debug, Default)]
pub struct ClassifiedDocument {
    pub paragraphs: Vec<ClassifiedParagraph>,
    pub errors: ErrorLog,
    pub list_fixes: Vec<ListFix>,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    section_regex: Regex,
    end_of_section_regex: Regex,
    part_regex: Regex,
    part_title_regex: Regex,
    subsection_regex: Regex,
    subsection_alt_regex: Regex,
    item_regex: Regex,
    list_regex: Regex,
    sub_list_regex: Regex,
    part_names: Vec<String>,
    subsection_titles: Vec<String>,
    thresholds: HeuristicThresholds,
}

impl Classifier {
    pub fn new(vocabulary: &Vocabulary, thresholds: &HeuristicThresholds) -> Result<Self> {
        let section_regex = Regex::new(&format!(
            r"(?i)^{}\s+(.+)$",
            marker_pattern(&vocabulary.section_marker)
        ))
        .context("failed to compile section regex")?;
        let end_of_section_regex = Regex::new(&format!(
            r"(?i)^{}\b\s*(.*)$",
            marker_pattern(&vocabulary.end_of_section_marker)
        ))
        .context("failed to compile end of section regex")?;
        let part_regex =
            Regex::new(r"^(\d+)\.0\s+(.+)$").context("failed to compile part regex")?;

        let part_names = vocabulary
            .part_names
            .iter()
            .map(|name| name.trim().to_uppercase())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();
        let part_alternation = if part_names.is_empty() {
            r"[^\s\S]".to_string()
        } else {
            part_names
                .iter()
                .map(|name| regex::escape(name))
                .collect::<Vec<_>>()
                .join("|")
        };
        let part_title_regex = Regex::new(&format!(
            r"^(?:PART\s*)?(\d+)(?:\.0)?\s*[-:]?\s*({part_alternation})$"
        ))
        .context("failed to compile part title regex")?;

        let subsection_regex = Regex::new(r"^(\d+\.\d{2})\s+(.+)$")
            .context("failed to compile subsection regex")?;
        let subsection_alt_regex = Regex::new(r"^(\d+\.\d)\s+(.+)$")
            .context("failed to compile legacy subsection regex")?;
        let item_regex =
            Regex::new(r"^([A-Z])\.\s+(.+)$").context("failed to compile item regex")?;
        let list_regex =
            Regex::new(r"^(\d+)\.\s+(.+)$").context("failed to compile list regex")?;
        let sub_list_regex =
            Regex::new(r"^([a-z])\.\s+(.+)$").context("failed to compile sub-list regex")?;

        let subsection_titles = vocabulary
            .subsection_titles
            .iter()
            .map(|title| title.trim().to_uppercase())
            .filter(|title| !title.is_empty())
            .collect::<Vec<_>>();

        Ok(Self {
            section_regex,
            end_of_section_regex,
            part_regex,
            part_title_regex,
            subsection_regex,
            subsection_alt_regex,
            item_regex,
            list_regex,
            sub_list_regex,
            part_names,
            subsection_titles,
            thresholds: thresholds.clone(),
        })
    }

    pub fn classify(
        &self,
        index: usize,
        text: &str,
        state: &mut ClassifierState,
        errors: &mut ErrorLog,
    ) -> ClassifiedParagraph {
        let trimmed = text.trim();
        let line_number = index + 1;
        let classified = |level_type: LevelType, number: Option<String>, content: &str| {
            ClassifiedParagraph {
                index,
                line_number,
                level_type,
                number,
                content: content.trim().to_string(),
                source_text: text.to_string(),
                number_origin: NumberOrigin::Explicit,
            }
        };

        if trimmed.is_empty() {
            return classified(LevelType::Empty, None, "");
        }

        if let Some(captures) = self.section_regex.captures(trimmed) {
            let rest = captures.get(1).map_or("", |m| m.as_str()).trim();
            if !state.section_header_seen {
                state.section_header_seen = true;
                return classified(LevelType::Section, Some(section_number_token(rest)), rest);
            }

            errors.push(ExtractionError::new(
                line_number,
                ErrorType::StructureError,
                "Duplicate section header found",
                trimmed,
            ));
            return classified(LevelType::Content, None, trimmed);
        }

        if state.section_header_seen && !state.section_title_seen {
            state.section_title_seen = true;
            return classified(LevelType::Title, None, trimmed);
        }

        if let Some(captures) = self.end_of_section_regex.captures(trimmed) {
            let suffix = captures.get(1).map_or("", |m| m.as_str()).trim();
            let number = (!suffix.is_empty()).then(|| suffix.to_string());
            return classified(LevelType::EndOfSection, number, suffix);
        }

        if let Some(captures) = self.part_regex.captures(trimmed) {
            state.parts_seen += 1;
            let number = format!("{}.0", &captures[1]);
            return classified(LevelType::Part, Some(number), &captures[2]);
        }

        let upper = trimmed.to_uppercase();
        if let Some(captures) = self.part_title_regex.captures(&upper) {
            state.parts_seen += 1;
            let number = format!("{}.0", &captures[1]);
            return classified(LevelType::PartTitle, Some(number), &captures[2]);
        }

        let bare = upper.trim_start_matches("PART").trim();
        if self.part_names.iter().any(|name| name == bare) {
            state.parts_seen += 1;
            let number = format!("{}.0", state.parts_seen);
            let mut paragraph = classified(LevelType::PartTitle, Some(number), bare);
            paragraph.number_origin = NumberOrigin::Assigned;
            return paragraph;
        }

        if let Some(captures) = self
            .subsection_regex
            .captures(trimmed)
            .or_else(|| self.subsection_alt_regex.captures(trimmed))
        {
            let number = normalize(LevelType::Subsection, &captures[1]);
            return classified(LevelType::Subsection, Some(number), &captures[2]);
        }

        if let Some(captures) = self.item_regex.captures(trimmed) {
            return classified(LevelType::Item, Some(captures[1].to_string()), &captures[2]);
        }

        if let Some(captures) = self.list_regex.captures(trimmed) {
            return classified(LevelType::List, Some(captures[1].to_string()), &captures[2]);
        }

        if let Some(captures) = self.sub_list_regex.captures(trimmed) {
            return classified(LevelType::SubList, Some(captures[1].to_string()), &captures[2]);
        }

        if self.is_subsection_title(trimmed) {
            return classified(LevelType::SubsectionTitle, None, trimmed);
        }

        classified(LevelType::Content, None, trimmed)
    }

    fn is_subsection_title(&self, text: &str) -> bool {
        let candidate = text.trim().trim_end_matches(':').trim().to_uppercase();
        if candidate.is_empty() {
            return false;
        }

        if self.subsection_titles.iter().any(|title| *title == candidate) {
            return true;
        }

        if !looks_like_subsection_title(text, &self.thresholds) {
            return false;
        }

        self.subsection_titles.iter().any(|title| {
            candidate.contains(title.as_str()) || (candidate.len() >= 4 && title.contains(&candidate))
        })
    }

    pub fn classify_document(
        &self,
        paragraphs: &[Paragraph],
        numbering: Option<&NumberingTable>,
    ) -> ClassifiedDocument {
        let mut state = ClassifierState::default();
        let mut document = ClassifiedDocument::default();
        let mut corrector = ListNumberCorrector::new();

        for paragraph in paragraphs {
            let mut classified =
                self.classify(paragraph.index, &paragraph.text, &mut state, &mut document.errors);

            if let (Some(list_id), Some(list_level)) =
                (paragraph.list_id.as_deref(), paragraph.list_level)
            {
                self.apply_native_numbering(
                    &mut classified,
                    list_id,
                    list_level,
                    numbering,
                    &mut corrector,
                    &mut document.list_fixes,
                );
            }

            if classified.level_type != LevelType::Empty {
                document.paragraphs.push(classified);
            }
        }

        document
    }

    fn apply_native_numbering(
        &self,
        classified: &mut ClassifiedParagraph,
        list_id: &str,
        list_level: u8,
        numbering: Option<&NumberingTable>,
        corrector: &mut ListNumberCorrector,
        list_fixes: &mut Vec<ListFix>,
    ) {
        if classified.level_type == LevelType::Content
            && classified.content.chars().count() < self.thresholds.native_retype_max_chars
            && !starts_with_structural_keyword(&classified.content)
        {
            let format = numbering.and_then(|table| table.level_format(list_id, list_level));
            classified.level_type = native_level_type(format, list_level);
        }

        let Some(scheme) = NumberScheme::for_level(classified.level_type) else {
            return;
        };
        if matches!(scheme, NumberScheme::Part | NumberScheme::Subsection) {
            // Headings keep their typed number but still restart the deeper levels.
            corrector.advance(list_id, list_level);
            return;
        }

        let correct = corrector.next_number(list_id, list_level, scheme);
        let detected = classified.number.clone();
        if detected.as_deref() == Some(correct.as_str()) {
            return;
        }

        if detected.is_some() {
            list_fixes.push(ListFix {
                line_number: classified.line_number,
                text: classified.content.chars().take(50).collect(),
                detected_number: detected,
                correct_number: correct.clone(),
                list_id: list_id.to_string(),
                list_level,
            });
        }

        classified.number = Some(correct);
        classified.number_origin = NumberOrigin::Native;
    }
}

fn native_level_type(format: Option<NumberFormat>, list_level: u8) -> LevelType {
    match format {
        Some(NumberFormat::UpperLetter) => LevelType::Item,
        Some(NumberFormat::Decimal | NumberFormat::DecimalZero) => LevelType::List,
        Some(NumberFormat::LowerLetter) => LevelType::SubList,
        _ => match list_level {
            1 => LevelType::SubList,
            _ => LevelType::List,
        },
    }
}

fn marker_pattern(marker: &str) -> String {
    marker
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

fn section_number_token(rest: &str) -> String {
    let token = rest
        .chars()
        .take_while(|ch| ch.is_ascii_digit() || matches!(ch, ' ' | '-' | '.' | '_'))
        .collect::<String>();
    let token = token.trim().trim_end_matches(['-', '.', '_']).trim();

    if token.chars().any(|ch| ch.is_ascii_digit()) {
        token.to_string()
    } else {
        rest.to_string()
    }
}

pub fn section_code(section_number: &str) -> Option<String> {
    let code = section_number
        .chars()
        .filter(|ch| ch.is_ascii_digit())
        .collect::<String>();
    (!code.is_empty()).then_some(code)
}
