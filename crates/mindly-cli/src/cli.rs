use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "mindly",
    about = "Inspect and extend Mindly mind-map data",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Data directory; overrides `mindly_data_dir` from the config file
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List name paths, node records, or file payloads
    #[command(alias = "print")]
    Ls(LsArgs),
    /// Create a node under the node at the given name path, then write
    Add(AddArgs),
    /// Check the loaded indices and proxies for inconsistencies
    Check,
}

#[derive(Args)]
pub struct LsArgs {
    #[arg(value_enum, default_value = "paths")]
    pub what: Listing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Listing {
    /// Every node's name lineage
    Paths,
    /// Every node's record
    Nodes,
    /// The decoded index and documents
    Files,
}

#[derive(Args)]
pub struct AddArgs {
    pub text: String,
    /// One name of the parent's lineage; repeat for each level. No
    /// `--parent` creates a section.
    #[arg(long = "parent", value_name = "NAME")]
    pub parent: Vec<String>,
    #[arg(long)]
    pub note: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub idea_type: Option<i64>,
    #[arg(long)]
    pub color_theme_type: Option<i64>,
}
