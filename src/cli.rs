use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fib")]
#[command(author, version, about = "Tag-level FLV editor")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Disable logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan an FLV file and write an editable rebase plan
    Parse {
        /// FLV file to scan
        input: PathBuf,

        /// Plan file to write
        plan: PathBuf,

        /// Overwrite an existing plan file
        #[arg(short, long)]
        force: bool,

        /// Do not record the input's hash
        #[arg(long)]
        skip_hash: bool,
    },

    /// Build an FLV file from a rebase plan
    Build {
        /// Plan file to read
        plan: PathBuf,

        /// FLV file to write
        output: PathBuf,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,
    },

    /// Print or save one tag of an FLV file
    Extract {
        /// FLV file to read
        input: PathBuf,

        /// Zero-based tag number
        index: usize,

        /// Write the framed tag here instead of printing it
        output: Option<PathBuf>,

        /// Print script tags as hex instead of JSON
        #[arg(short, long)]
        bytes: bool,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,
    },

    /// Display version information
    Version,
}
