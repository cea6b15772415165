//! CLI module for prosearch
//!
//! Provides command-line interface parsing for the prosearch binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file, used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "prosearch.toml";

/// prosearch - Iterative multi-round web research
#[derive(Parser, Debug)]
#[command(
    name = "prosearch",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "prosearch - Iterative multi-round web research",
    long_about = "Answers a question by running rounds of concurrent grounded web searches,\n\
                  reflecting on whether the evidence is sufficient, and writing a cited answer.",
    after_help = "EXAMPLES:\n    \
                  prosearch research \"quantum computing basics\"\n    \
                  prosearch research \"rust async runtimes\" --max-loops 3 --json\n    \
                  prosearch config --validate\n    \
                  prosearch --config my.toml research \"topic\""
)]
pub struct Cli {
    /// Path to the configuration file [default: prosearch.toml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a topic and print a cited answer
    Research {
        /// The question or topic to research
        topic: String,

        /// Number of search queries in the first round
        #[arg(short = 'q', long)]
        initial_queries: Option<usize>,

        /// Maximum number of research rounds
        #[arg(short = 'm', long)]
        max_loops: Option<usize>,

        /// Model used for reflection and the final answer
        #[arg(long)]
        reasoning_model: Option<String>,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration and check the API key is set
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Configuration path, falling back to the default location
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}
