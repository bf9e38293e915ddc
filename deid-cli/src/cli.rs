use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// De-identify documents containing protected health information.
#[derive(Debug, Parser)]
#[command(name = "deid", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the de-identification pipeline over one or more input files.
    Process(ProcessArgs),
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Input files to de-identify.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Characters per chunk fed to the identifier.
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Characters of overlap between consecutive chunks.
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// Disable regulation-context retrieval; the identifier falls back to
    /// minimal context.
    #[arg(long)]
    pub no_rag: bool,

    /// Disable the deterministic tool scanners (regex, ID validator, phone).
    #[arg(long)]
    pub no_tools: bool,

    /// Resume a previous run from its checkpoint directory instead of
    /// starting from scratch.
    #[arg(long)]
    pub resume: bool,

    /// Directory masked output and the run's job report are written to.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Directory per-chunk checkpoints are written to and resumed from.
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Model name passed to the LLM client.
    #[arg(long)]
    pub model: Option<String>,
}
