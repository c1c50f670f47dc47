use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "specconv",
    version,
    about = "Construction specification section converter and structure checker"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Convert(ConvertArgs),
    Regenerate(RegenerateArgs),
    Template(TemplateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    pub input: PathBuf,

    #[arg(default_value = "output")]
    pub output_dir: PathBuf,

    pub template: Option<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub skip_docx: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RegenerateArgs {
    pub json: PathBuf,

    pub template: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct TemplateArgs {
    pub template: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,
}
