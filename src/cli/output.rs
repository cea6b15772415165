//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for research results.

use crate::research::RoundSummary;
use crate::types::SourceCitation;
use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the run banner with the topic being researched
    pub fn banner(&self, topic: &str) {
        if self.colored {
            println!(
                "\n  {} {}",
                "prosearch".bright_cyan().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
            println!("  {} {}\n", "Researching:".dimmed(), topic.bright_white());
        } else {
            println!("\n  prosearch v{}", env!("CARGO_PKG_VERSION"));
            println!("  Researching: {}\n", topic);
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print the answer body, unindented so markdown stays intact
    pub fn answer(&self, text: &str) {
        println!("\n{}\n", text.trim_end());
    }

    /// Print one line per completed research round
    pub fn rounds(&self, summaries: &[RoundSummary]) {
        for summary in summaries {
            let verdict = if summary.sufficient {
                "sufficient"
            } else {
                "needs more"
            };
            let line = format!(
                "Round {}: {} queries, {}",
                summary.round, summary.results_merged, verdict
            );
            if self.colored {
                println!("    {} {}", "•".blue(), line.dimmed());
            } else {
                println!("    - {}", line);
            }
        }
    }

    /// Print the numbered list of cited sources
    pub fn sources(&self, sources: &[SourceCitation]) {
        if sources.is_empty() {
            self.info("No sources cited");
            return;
        }

        for (i, source) in sources.iter().enumerate() {
            if self.colored {
                println!(
                    "    {} {} {}",
                    format!("[{}]", i + 1).dimmed(),
                    source.label.bright_white(),
                    source.original_value.cyan().underline()
                );
            } else {
                println!("    [{}] {} {}", i + 1, source.label, source.original_value);
            }
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }
}
