use anyhow::{Context, Result};
use tracing::info;

use crate::cli::TemplateArgs;
use crate::config::load_config;
use crate::template::load_template;
use crate::util::write_json_pretty;

pub fn run(args: TemplateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let template = load_template(&args.template, &config.styles)?;
    let analysis = template.mapping.analysis();

    match args.output {
        Some(path) => {
            write_json_pretty(&path, &analysis)?;
            info!(
                path = %path.display(),
                levels = analysis.levels.len(),
                missing = analysis.missing_levels.len(),
                "wrote template analysis"
            );
        }
        None => {
            let rendered = serde_json::to_string_pretty(&analysis)
                .context("failed to serialize template analysis")?;
            println!("{rendered}");
        }
    }

    Ok(())
}
