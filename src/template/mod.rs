use std::path::Path;

use anyhow::{Context, Result};

use crate::config::StyleFamily;
use crate::docx::DocxPackage;

mod mapping;
#[cfg(test)]
mod tests;

pub use mapping::{StyleDescriptor, TemplateAnalysis, TemplateLevelMapping};

pub struct LoadedTemplate {
    pub package: DocxPackage,
    pub mapping: TemplateLevelMapping,
}

pub fn load_template(path: &Path, family: &StyleFamily) -> Result<LoadedTemplate> {
    let package = DocxPackage::open(path)
        .with_context(|| format!("failed to load template: {}", path.display()))?;
    let mapping = TemplateLevelMapping::load(&package, package.label(), family)
        .with_context(|| format!("failed to analyze template: {}", path.display()))?;

    Ok(LoadedTemplate { package, mapping })
}
