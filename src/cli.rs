use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Project configuration directory (or the project.json inside it)
    pub config: PathBuf,
    /// Print a unified diff against the existing tree, write nothing
    #[arg(long)]
    pub dry_run: bool,
    /// Restrict emitted paths to those matching the glob
    #[arg(long, value_name = "GLOB")]
    pub only: Option<String>,
    /// Template corpus root
    #[arg(long, value_name = "DIR", default_value = "data/source")]
    pub templates: PathBuf,
    /// Output tree root
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,
    /// Log progress per artifact
    #[arg(short, long)]
    pub verbose: bool,
}
