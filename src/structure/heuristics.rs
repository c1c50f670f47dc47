use crate::config::HeuristicThresholds;

const TERMINAL_PUNCTUATION: [char; 5] = ['.', ':', ';', '!', '?'];
const STRUCTURAL_KEYWORDS: [&str; 3] = ["SECTION", "PART", "END OF SECTION"];

pub fn has_numbering_prefix(text: &str) -> bool {
    strip_numbering_prefix(text).is_some()
}

pub fn strip_numbering_prefix(text: &str) -> Option<&str> {
    let trimmed = text.trim_start();
    let first = trimmed.chars().next()?;

    let rest = if first.is_ascii_digit() {
        let end = trimmed
            .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
            .unwrap_or(trimmed.len());
        if !trimmed[..end].contains('.') {
            return None;
        }
        &trimmed[end..]
    } else if first.is_ascii_alphabetic() {
        trimmed[first.len_utf8()..].strip_prefix('.')?
    } else {
        return None;
    };

    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

pub fn starts_with_structural_keyword(text: &str) -> bool {
    let upper = text.trim_start().to_uppercase();
    STRUCTURAL_KEYWORDS
        .iter()
        .any(|keyword| upper.starts_with(keyword))
}

pub fn looks_like_item_content(text: &str, thresholds: &HeuristicThresholds) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || has_numbering_prefix(trimmed) {
        return false;
    }

    trimmed.ends_with(TERMINAL_PUNCTUATION)
        || trimmed.chars().count() >= thresholds.item_content_min_chars
}

pub fn looks_like_list_content(text: &str, thresholds: &HeuristicThresholds) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || has_numbering_prefix(trimmed) {
        return false;
    }

    let starts_uppercase = trimmed
        .chars()
        .next()
        .is_some_and(|ch| ch.is_uppercase());

    starts_uppercase && trimmed.chars().count() <= thresholds.list_content_max_chars
}

pub fn looks_like_subsection_title(text: &str, thresholds: &HeuristicThresholds) -> bool {
    let trimmed = text.trim().trim_end_matches(':').trim();
    if trimmed.is_empty()
        || has_numbering_prefix(trimmed)
        || trimmed.ends_with('.')
        || trimmed.chars().count() > thresholds.subsection_title_max_chars
    {
        return false;
    }

    let mut letters = trimmed.chars().filter(|ch| ch.is_alphabetic()).peekable();
    if letters.peek().is_none() {
        return false;
    }

    letters.all(|ch| ch.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_prefix_detects_competing_patterns() {
        assert!(has_numbering_prefix("A. Provide"));
        assert!(has_numbering_prefix("1. Provide"));
        assert!(has_numbering_prefix("1.01 SCOPE"));
        assert!(has_numbering_prefix("b."));
        assert!(!has_numbering_prefix("Provide labor services"));
        assert!(!has_numbering_prefix("2024 edition applies"));
        assert!(!has_numbering_prefix("U.S. standards"));
    }

    #[test]
    fn strip_numbering_prefix_returns_remaining_text() {
        assert_eq!(strip_numbering_prefix("1.01\tSCOPE"), Some("SCOPE"));
        assert_eq!(strip_numbering_prefix("a. Conduit"), Some("Conduit"));
        assert_eq!(strip_numbering_prefix("A."), Some(""));
        assert_eq!(strip_numbering_prefix("Conduit"), None);
    }

    #[test]
    fn item_content_needs_punctuation_or_length() {
        let thresholds = HeuristicThresholds::default();
        assert!(looks_like_item_content("Submit shop drawings.", &thresholds));
        assert!(looks_like_item_content(
            "Submit shop drawings for all equipment within thirty days",
            &thresholds
        ));
        assert!(!looks_like_item_content("Short fragment", &thresholds));
        assert!(!looks_like_item_content("1. Numbered", &thresholds));
        assert!(!looks_like_item_content("   ", &thresholds));
    }

    #[test]
    fn list_content_is_short_and_capitalized() {
        let thresholds = HeuristicThresholds::default();
        assert!(looks_like_list_content("Provide labor services", &thresholds));
        assert!(!looks_like_list_content("continuation of prior text", &thresholds));
        assert!(!looks_like_list_content(&"Long ".repeat(60), &thresholds));
        assert!(!looks_like_list_content("a. lettered", &thresholds));
    }

    #[test]
    fn subsection_title_requires_short_uppercase_heading() {
        let thresholds = HeuristicThresholds::default();
        assert!(looks_like_subsection_title("SUBMITTALS", &thresholds));
        assert!(looks_like_subsection_title("QUALITY ASSURANCE:", &thresholds));
        assert!(!looks_like_subsection_title("Submittals", &thresholds));
        assert!(!looks_like_subsection_title("SEE NOTE.", &thresholds));
        assert!(!looks_like_subsection_title("1.02 SUBMITTALS", &thresholds));
        assert!(!looks_like_subsection_title("2024", &thresholds));
    }
}
