use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub vocabulary: Vocabulary,
    pub heuristics: HeuristicThresholds,
    pub styles: StyleFamily,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub section_marker: String,
    pub end_of_section_marker: String,
    pub part_names: Vec<String>,
    pub subsection_titles: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            section_marker: "SECTION".to_string(),
            end_of_section_marker: "END OF SECTION".to_string(),
            part_names: ["GENERAL", "PRODUCTS", "EXECUTION", "DESCRIPTION"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
            subsection_titles: [
                "SCOPE",
                "EXISTING CONDITIONS",
                "CODES AND REGULATIONS",
                "DEFINITIONS",
                "DRAWINGS AND SPECIFICATIONS",
                "SITE VISIT",
                "DEVIATIONS",
                "STANDARDS FOR MATERIALS AND WORKMANSHIP",
                "SHOP DRAWINGS AND SUBMITTAL",
                "RECORD (AS-BUILT) DRAWINGS AND MAINTENANCE MANUALS",
                "COORDINATION",
                "PROTECTION OF MATERIALS",
                "TESTS, DEMONSTRATION AND INSTRUCTIONS",
                "GUARANTEE",
            ]
            .iter()
            .map(|title| title.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicThresholds {
    pub item_content_min_chars: usize,
    pub list_content_max_chars: usize,
    pub subsection_title_max_chars: usize,
    pub native_retype_max_chars: usize,
}

impl Default for HeuristicThresholds {
    fn default() -> Self {
        Self {
            item_content_min_chars: 40,
            list_content_max_chars: 80,
            subsection_title_max_chars: 60,
            native_retype_max_chars: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleFamily {
    pub part: String,
    pub subsection: String,
    pub item: String,
    pub list: String,
    pub sub_list: String,
    pub section_number: String,
    pub section_title: String,
    pub end_of_section: String,
    pub fallback: String,
}

impl Default for StyleFamily {
    fn default() -> Self {
        Self {
            part: "BWA-PART".to_string(),
            subsection: "BWA-SUBSECTION".to_string(),
            item: "BWA-Item".to_string(),
            list: "BWA-List".to_string(),
            sub_list: "BWA-SubList".to_string(),
            section_number: "BWA-SectionNumber".to_string(),
            section_title: "BWA-SectionTitle".to_string(),
            end_of_section: "BWA-EndOfSection".to_string(),
            fallback: "Normal".to_string(),
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<ConverterConfig> {
    let Some(path) = path else {
        return Ok(ConverterConfig::default());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config = serde_json::from_str::<ConverterConfig>(&raw)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config = serde_json::from_str::<ConverterConfig>(
            r#"{"vocabulary": {"subsection_titles": ["WARRANTY"]}, "heuristics": {"item_content_min_chars": 10}}"#,
        )
        .expect("config should parse");

        assert_eq!(config.vocabulary.subsection_titles, vec!["WARRANTY"]);
        assert_eq!(config.vocabulary.section_marker, "SECTION");
        assert_eq!(config.vocabulary.part_names.len(), 4);
        assert_eq!(config.heuristics.item_content_min_chars, 10);
        assert_eq!(config.heuristics.list_content_max_chars, 80);
        assert_eq!(config.styles.part, "BWA-PART");
    }

    #[test]
    fn default_vocabulary_keeps_combined_tests_title() {
        let titles = ConverterConfig::default().vocabulary.subsection_titles;
        assert_eq!(titles.len(), 14);
        assert!(titles.iter().any(|title| title == "TESTS, DEMONSTRATION AND INSTRUCTIONS"));
        assert!(!titles.iter().any(|title| title == "TESTS"));
    }

    #[test]
    fn missing_config_path_uses_defaults() {
        let config = load_config(None).expect("default config");
        assert_eq!(config, ConverterConfig::default());
    }
}
