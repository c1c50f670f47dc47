use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::StyleFamily;
use crate::docx::{
    DocumentSource, Indentation, NumberFormat, NumberingLevel, NumberingTable, StyleDefinition,
    StyleTable,
};
use crate::structure::LevelType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    pub level_type: LevelType,
    pub style_id: String,
    pub style_name: String,
    pub numbering_id: Option<String>,
    pub abstract_num_id: Option<String>,
    pub list_level_index: Option<u8>,
    pub indentation: Indentation,
    pub justification: Option<String>,
    pub suffix: Option<String>,
    pub number_format: Option<NumberFormat>,
    pub level_text: Option<String>,
    pub used_fallback_styling: bool,
}

impl StyleDescriptor {
    fn plain(level_type: LevelType, style: &str, used_fallback_styling: bool) -> Self {
        Self {
            level_type,
            style_id: style.to_string(),
            style_name: style.to_string(),
            numbering_id: None,
            abstract_num_id: None,
            list_level_index: None,
            indentation: Indentation::default(),
            justification: None,
            suffix: None,
            number_format: None,
            level_text: None,
            used_fallback_styling,
        }
    }

    pub fn is_numbered(&self) -> bool {
        self.numbering_id.is_some() && self.list_level_index.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateAnalysis {
    pub template: Option<String>,
    pub fallback_style: String,
    pub abstract_numbering_count: usize,
    pub numbering_instance_count: usize,
    pub style_count: usize,
    pub levels: Vec<StyleDescriptor>,
    pub missing_levels: Vec<LevelType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLevelMapping {
    template: Option<String>,
    fallback_style: String,
    levels: BTreeMap<LevelType, StyleDescriptor>,
    missing_levels: Vec<LevelType>,
    abstract_numbering_count: usize,
    numbering_instance_count: usize,
    style_count: usize,
}

impl TemplateLevelMapping {
    pub fn load(source: &dyn DocumentSource, label: &str, family: &StyleFamily) -> Result<Self> {
        let numbering = source.read_numbering_definitions()?;
        let styles = source.read_styles()?;
        let mapping = Self::build(&numbering, &styles, family, Some(label));

        info!(
            template = label,
            levels = mapping.levels.len(),
            missing = mapping.missing_levels.len(),
            "loaded template level mapping"
        );
        if !mapping.missing_levels.is_empty() {
            let missing = mapping
                .missing_levels
                .iter()
                .map(|level_type| level_type.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            warn!(template = label, missing = %missing, "template lacks styles for some levels");
        }

        Ok(mapping)
    }

    pub fn unstyled(family: &StyleFamily) -> Self {
        Self::build(&NumberingTable::default(), &StyleTable::default(), family, None)
    }

    pub fn build(
        numbering: &NumberingTable,
        styles: &StyleTable,
        family: &StyleFamily,
        template: Option<&str>,
    ) -> Self {
        let mut levels = BTreeMap::new();
        let mut missing_levels = Vec::new();

        for (level_type, style_name) in mapped_levels(family) {
            match styles.by_name(style_name) {
                Some(style) => {
                    levels.insert(level_type, describe(level_type, style, styles, numbering));
                }
                None => missing_levels.push(level_type),
            }
        }

        Self {
            template: template.map(str::to_string),
            fallback_style: family.fallback.clone(),
            levels,
            missing_levels,
            abstract_numbering_count: numbering.abstracts.len(),
            numbering_instance_count: numbering.nums.len(),
            style_count: styles.styles.len(),
        }
    }

    pub fn resolve(&self, level_type: LevelType) -> StyleDescriptor {
        if let Some(descriptor) = self.levels.get(&canonical_level(level_type)) {
            let mut descriptor = descriptor.clone();
            descriptor.level_type = level_type;
            return descriptor;
        }

        let used_fallback_styling = !matches!(level_type, LevelType::Content | LevelType::Empty);
        StyleDescriptor::plain(level_type, &self.fallback_style, used_fallback_styling)
    }

    pub fn missing_levels(&self) -> &[LevelType] {
        &self.missing_levels
    }

    pub fn analysis(&self) -> TemplateAnalysis {
        TemplateAnalysis {
            template: self.template.clone(),
            fallback_style: self.fallback_style.clone(),
            abstract_numbering_count: self.abstract_numbering_count,
            numbering_instance_count: self.numbering_instance_count,
            style_count: self.style_count,
            levels: self.levels.values().cloned().collect(),
            missing_levels: self.missing_levels.clone(),
        }
    }
}

fn mapped_levels(family: &StyleFamily) -> [(LevelType, &str); 8] {
    [
        (LevelType::Section, family.section_number.as_str()),
        (LevelType::Title, family.section_title.as_str()),
        (LevelType::EndOfSection, family.end_of_section.as_str()),
        (LevelType::Part, family.part.as_str()),
        (LevelType::Subsection, family.subsection.as_str()),
        (LevelType::Item, family.item.as_str()),
        (LevelType::List, family.list.as_str()),
        (LevelType::SubList, family.sub_list.as_str()),
    ]
}

fn canonical_level(level_type: LevelType) -> LevelType {
    match level_type {
        LevelType::PartTitle => LevelType::Part,
        LevelType::SubsectionTitle => LevelType::Subsection,
        other => other,
    }
}

fn describe(
    level_type: LevelType,
    style: &StyleDefinition,
    styles: &StyleTable,
    numbering: &NumberingTable,
) -> StyleDescriptor {
    let style_name = style.name.clone().unwrap_or_else(|| style.style_id.clone());
    let mut descriptor = StyleDescriptor {
        level_type,
        style_id: style.style_id.clone(),
        style_name,
        numbering_id: None,
        abstract_num_id: None,
        list_level_index: None,
        indentation: style.indentation,
        justification: style.justification.clone(),
        suffix: None,
        number_format: None,
        level_text: None,
        used_fallback_styling: false,
    };

    let by_style = styles
        .numbering_for(&style.style_id)
        .and_then(|(num_id, ilvl)| numbering.level(&num_id, ilvl).map(|level| (num_id, level)));
    let by_level = || {
        numbering
            .level_for_style(&style.style_id)
            .map(|(num_id, _, level)| (num_id, level))
    };

    if let Some((num_id, level)) = by_style.or_else(by_level) {
        apply_level(&mut descriptor, numbering, num_id, level);
    }

    descriptor
}

fn apply_level(
    descriptor: &mut StyleDescriptor,
    numbering: &NumberingTable,
    num_id: String,
    level: &NumberingLevel,
) {
    descriptor.abstract_num_id = numbering.abstract_id(&num_id).map(str::to_string);
    descriptor.numbering_id = Some(num_id);
    descriptor.list_level_index = Some(level.ilvl);
    descriptor.indentation = level.indentation.or(descriptor.indentation);
    descriptor.justification = level
        .justification
        .clone()
        .or_else(|| descriptor.justification.clone());
    descriptor.suffix = Some(level.suffix.clone().unwrap_or_else(|| "tab".to_string()));
    descriptor.number_format = Some(level.num_fmt);
    descriptor.level_text = level.lvl_text.clone();
}
