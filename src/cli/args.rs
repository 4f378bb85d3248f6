//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

use crate::application::{OutputFormat, OutputMode};
use crate::domain::MergePolicy;

/// Compile a directory of YAML/JSON fragments into one deterministic document
#[derive(Parser, Debug)]
#[command(name = "yamlpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a pack directory into one document
    Build {
        /// Pack directory
        #[arg(value_hint = ValueHint::DirPath)]
        dir: PathBuf,

        /// Output format: yaml or json
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Indent width of the output
        #[arg(short, long)]
        indent: Option<usize>,

        /// Write to FILE instead of stdout (atomically)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,

        #[command(flatten)]
        pack: PackArgs,
    },

    /// Show the levels of a pack and the files contributing to them
    Tree {
        /// Pack directory
        #[arg(value_hint = ValueHint::DirPath)]
        dir: PathBuf,

        #[command(flatten)]
        pack: PackArgs,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options shared by every command that walks a pack.
#[derive(Args, Debug, Default, Clone)]
pub struct PackArgs {
    /// Output mode: canonical or preserve
    #[arg(short, long)]
    pub mode: Option<OutputMode>,

    /// Merge strategy for repeated keys: shallow or deep
    #[arg(long)]
    pub merge: Option<MergePolicy>,

    /// Resolve !include, !include-text and <<include(path)>>
    #[arg(long)]
    pub includes: bool,

    /// Directory includes may not escape (default: the pack directory)
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub pack_root: Option<PathBuf>,

    /// Convert unquoted y/yes/on and n/no/off to booleans
    #[arg(long)]
    pub convert_booleans: bool,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective config for a pack directory
    Show {
        /// Pack directory whose local config is applied
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}
