//! CLI definitions for botreview.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// botreview CLI.
#[derive(Parser, Debug)]
#[command(name = "botreview")]
#[command(about = "Auto-approve dependency-bot pull requests and request reviewers")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.botreview/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Settings file path, overriding `settings.path` from the configuration
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Watch the browser and handle every pull-request page load (default)
    Watch,

    /// Run once against a single open page
    Run {
        /// Target id or URL fragment (default: the first pull-request page)
        #[arg(short, long)]
        target: Option<String>,
    },

    /// List attachable pages
    Pages,
}
