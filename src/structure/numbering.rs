use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::classify::LevelType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberScheme {
    Part,
    Subsection,
    UpperLetter,
    Decimal,
    LowerLetter,
}

impl NumberScheme {
    pub fn for_level(level_type: LevelType) -> Option<Self> {
        match level_type {
            LevelType::Part | LevelType::PartTitle => Some(Self::Part),
            LevelType::Subsection | LevelType::SubsectionTitle => Some(Self::Subsection),
            LevelType::Item => Some(Self::UpperLetter),
            LevelType::List => Some(Self::Decimal),
            LevelType::SubList => Some(Self::LowerLetter),
            _ => None,
        }
    }

    pub fn format(self, ordinal: u32, parent: Option<&str>) -> String {
        match self {
            Self::Part => format!("{ordinal}.0"),
            Self::Subsection => {
                let part = parent.and_then(part_ordinal).unwrap_or(1);
                format!("{part}.{ordinal:02}")
            }
            Self::UpperLetter => ordinal_to_letters(ordinal, true),
            Self::Decimal => ordinal.to_string(),
            Self::LowerLetter => ordinal_to_letters(ordinal, false),
        }
    }

    pub fn ordinal(self, number: &str) -> Option<u32> {
        match self {
            Self::Part => part_ordinal(number),
            Self::Subsection => subsection_parts(number).map(|(_, sub)| sub),
            Self::UpperLetter => {
                if number.chars().all(|ch| ch.is_ascii_uppercase()) {
                    letters_to_ordinal(number)
                } else {
                    None
                }
            }
            Self::Decimal => number.trim().parse::<u32>().ok(),
            Self::LowerLetter => {
                if number.chars().all(|ch| ch.is_ascii_lowercase()) {
                    letters_to_ordinal(number)
                } else {
                    None
                }
            }
        }
    }
}

pub fn normalize(level_type: LevelType, raw_number: &str) -> String {
    match level_type {
        LevelType::Subsection | LevelType::SubsectionTitle => normalize_subsection_number(raw_number),
        _ => raw_number.to_string(),
    }
}

pub fn normalize_subsection_number(raw_number: &str) -> String {
    let trimmed = raw_number.trim();
    let Some((major, minor)) = trimmed.split_once('.') else {
        return trimmed.to_string();
    };

    let well_formed = !major.is_empty()
        && major.chars().all(|ch| ch.is_ascii_digit())
        && minor.len() == 1
        && minor.chars().all(|ch| ch.is_ascii_digit());
    if well_formed {
        return format!("{major}.{minor:0>2}");
    }

    trimmed.to_string()
}

pub fn part_ordinal(number: &str) -> Option<u32> {
    let trimmed = number.trim();
    let major = match trimmed.split_once('.') {
        Some((major, minor)) => {
            if !minor.chars().all(|ch| ch == '0') {
                return None;
            }
            major
        }
        None => trimmed,
    };

    major.parse::<u32>().ok()
}

pub fn subsection_parts(number: &str) -> Option<(u32, u32)> {
    let normalized = normalize_subsection_number(number);
    let (major, minor) = normalized.split_once('.')?;
    if minor.len() != 2 {
        return None;
    }

    Some((major.parse::<u32>().ok()?, minor.parse::<u32>().ok()?))
}

pub fn letters_to_ordinal(value: &str) -> Option<u32> {
    if value.is_empty() {
        return None;
    }

    let mut ordinal = 0u32;
    for ch in value.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        ordinal = ordinal.checked_mul(26)?.checked_add(digit)?;
    }

    Some(ordinal)
}

pub fn ordinal_to_letters(ordinal: u32, uppercase: bool) -> String {
    let base = if uppercase { b'A' } else { b'a' };
    let mut remaining = ordinal.max(1);
    let mut letters = Vec::new();

    while remaining > 0 {
        let offset = ((remaining - 1) % 26) as u8;
        letters.push((base + offset) as char);
        remaining = (remaining - 1) / 26;
    }

    letters.iter().rev().collect()
}

pub fn first_number(level_type: LevelType, parent: Option<&str>) -> Option<String> {
    NumberScheme::for_level(level_type).map(|scheme| scheme.format(1, parent))
}

pub fn successor(level_type: LevelType, number: &str) -> Option<String> {
    let scheme = NumberScheme::for_level(level_type)?;
    let normalized = normalize(level_type, number);
    let next = scheme.ordinal(&normalized)?.checked_add(1)?;

    match scheme {
        NumberScheme::Subsection => {
            let (part, _) = subsection_parts(&normalized)?;
            Some(format!("{part}.{next:02}"))
        }
        _ => Some(scheme.format(next, None)),
    }
}

pub fn is_ahead_of(level_type: LevelType, expected: &str, found: &str) -> bool {
    let Some(scheme) = NumberScheme::for_level(level_type) else {
        return false;
    };

    let expected = normalize(level_type, expected);
    let found = normalize(level_type, found);
    if scheme == NumberScheme::Subsection {
        match (subsection_parts(&expected), subsection_parts(&found)) {
            (Some((expected_part, expected_sub)), Some((found_part, found_sub))) => {
                return expected_part == found_part && found_sub > expected_sub;
            }
            _ => return false,
        }
    }

    match (scheme.ordinal(&expected), scheme.ordinal(&found)) {
        (Some(expected), Some(found)) => found > expected,
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFix {
    pub line_number: usize,
    pub text: String,
    pub detected_number: Option<String>,
    pub correct_number: String,
    pub list_id: String,
    pub list_level: u8,
}

#[derive(Debug, Default)]
pub struct ListNumberCorrector {
    counters: HashMap<(String, u8), u32>,
}

impl ListNumberCorrector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one paragraph at `list_level` and resets every deeper level of the same list.
    pub fn advance(&mut self, list_id: &str, list_level: u8) -> u32 {
        self.counters
            .retain(|(id, level), _| id != list_id || *level <= list_level);

        let counter = self
            .counters
            .entry((list_id.to_string(), list_level))
            .or_insert(0);
        *counter += 1;
        *counter
    }

    pub fn next_number(&mut self, list_id: &str, list_level: u8, scheme: NumberScheme) -> String {
        let ordinal = self.advance(list_id, list_level);
        scheme.format(ordinal, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_subsection_number_pads_single_digit_minor() {
        assert_eq!(normalize_subsection_number("1.1"), "1.01");
        assert_eq!(normalize_subsection_number("12.9"), "12.09");
        assert_eq!(normalize_subsection_number("1.01"), "1.01");
        assert_eq!(normalize_subsection_number("1.10"), "1.10");
    }

    #[test]
    fn normalize_is_idempotent_for_subsection_numbers() {
        for raw in ["1.1", "1.01", "3.7", "2.15", "bogus", "", "1.", ".4"] {
            let once = normalize(LevelType::Subsection, raw);
            let twice = normalize(LevelType::Subsection, &once);
            assert_eq!(once, twice, "normalize should be idempotent for {raw:?}");
        }
    }

    #[test]
    fn normalize_passes_other_levels_through() {
        assert_eq!(normalize(LevelType::Item, "A"), "A");
        assert_eq!(normalize(LevelType::List, "1"), "1");
        assert_eq!(normalize(LevelType::Part, "1.0"), "1.0");
    }

    #[test]
    fn letter_ordinals_wrap_past_z() {
        assert_eq!(ordinal_to_letters(1, true), "A");
        assert_eq!(ordinal_to_letters(26, true), "Z");
        assert_eq!(ordinal_to_letters(27, true), "AA");
        assert_eq!(ordinal_to_letters(28, false), "ab");
        assert_eq!(letters_to_ordinal("AA"), Some(27));
        assert_eq!(letters_to_ordinal("Z"), Some(26));
        assert_eq!(letters_to_ordinal("A1"), None);
    }

    #[test]
    fn successor_follows_each_level_scheme() {
        assert_eq!(successor(LevelType::Part, "1.0").as_deref(), Some("2.0"));
        assert_eq!(successor(LevelType::Subsection, "1.1").as_deref(), Some("1.02"));
        assert_eq!(successor(LevelType::Subsection, "2.09").as_deref(), Some("2.10"));
        assert_eq!(successor(LevelType::Item, "Z").as_deref(), Some("AA"));
        assert_eq!(successor(LevelType::List, "9").as_deref(), Some("10"));
        assert_eq!(successor(LevelType::SubList, "b").as_deref(), Some("c"));
        assert_eq!(successor(LevelType::Content, "1"), None);
    }

    #[test]
    fn is_ahead_of_requires_same_part_for_subsections() {
        assert!(is_ahead_of(LevelType::Subsection, "1.02", "1.03"));
        assert!(!is_ahead_of(LevelType::Subsection, "1.02", "2.03"));
        assert!(!is_ahead_of(LevelType::Subsection, "1.03", "1.02"));
        assert!(is_ahead_of(LevelType::Item, "B", "D"));
        assert!(!is_ahead_of(LevelType::Item, "B", "b"));
    }

    #[test]
    fn list_number_corrector_resets_deeper_levels() {
        let mut corrector = ListNumberCorrector::new();
        assert_eq!(corrector.next_number("5", 0, NumberScheme::UpperLetter), "A");
        assert_eq!(corrector.next_number("5", 1, NumberScheme::Decimal), "1");
        assert_eq!(corrector.next_number("5", 1, NumberScheme::Decimal), "2");
        assert_eq!(corrector.next_number("5", 0, NumberScheme::UpperLetter), "B");
        assert_eq!(corrector.next_number("5", 1, NumberScheme::Decimal), "1");
        assert_eq!(corrector.next_number("7", 1, NumberScheme::Decimal), "1");
    }

    #[test]
    fn advancing_a_heading_level_restarts_deeper_counters() {
        let mut corrector = ListNumberCorrector::new();
        corrector.advance("1", 1);
        assert_eq!(corrector.next_number("1", 2, NumberScheme::UpperLetter), "A");
        assert_eq!(corrector.next_number("1", 2, NumberScheme::UpperLetter), "B");
        assert_eq!(corrector.advance("1", 1), 2);
        assert_eq!(corrector.next_number("1", 2, NumberScheme::UpperLetter), "A");
    }
}
