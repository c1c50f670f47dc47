use serde::{Deserialize, Serialize};

const CONTEXT_SNIPPET_CHARS: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    StructureError,
    NumberingSequenceError,
    ContentError,
    ContentWarning,
    TemplateMappingError,
}

impl ErrorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::StructureError => "structure_error",
            ErrorType::NumberingSequenceError => "numbering_sequence_error",
            ErrorType::ContentError => "content_error",
            ErrorType::ContentWarning => "content_warning",
            ErrorType::TemplateMappingError => "template_mapping_error",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorType::StructureError => "STRUCTURE",
            ErrorType::NumberingSequenceError => "NUMBERING SEQUENCE",
            ErrorType::ContentError => "CONTENT",
            ErrorType::ContentWarning => "CONTENT WARNING",
            ErrorType::TemplateMappingError => "TEMPLATE MAPPING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionError {
    pub line_number: usize,
    pub error_type: ErrorType,
    pub message: String,
    pub context: String,
    pub expected: Option<String>,
    pub found: Option<String>,
}

impl ExtractionError {
    pub fn new(
        line_number: usize,
        error_type: ErrorType,
        message: impl Into<String>,
        context: &str,
    ) -> Self {
        Self {
            line_number,
            error_type,
            message: message.into(),
            context: snippet(context),
            expected: None,
            found: None,
        }
    }

    pub fn with_expected_found(mut self, expected: impl Into<String>, found: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.found = Some(found.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorLog {
    entries: Vec<ExtractionError>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ExtractionError) {
        self.entries.push(error);
    }

    pub fn extend(&mut self, other: ErrorLog) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[ExtractionError] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_of(&self, error_type: ErrorType) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.error_type == error_type)
            .count()
    }

    pub fn sort_by_line(&mut self) {
        self.entries.sort_by_key(|entry| entry.line_number);
    }

    pub fn into_vec(self) -> Vec<ExtractionError> {
        self.entries
    }
}

pub fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= CONTEXT_SNIPPET_CHARS {
        return trimmed.to_string();
    }

    let mut out = trimmed
        .chars()
        .take(CONTEXT_SNIPPET_CHARS)
        .collect::<String>();
    out.push_str("...");
    out
}
