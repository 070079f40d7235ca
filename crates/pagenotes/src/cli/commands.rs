//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Page id, or a unique prefix of one
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Page id, or a unique prefix of one
    pub id: String,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New content markup
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read new content markup from a file
    #[arg(long, value_name = "FILE")]
    pub content_file: Option<PathBuf>,

    /// Select all content and apply a formatting command (repeatable),
    /// e.g. bold, italic, underline, h1-h6, ul, ol
    #[arg(long = "format", value_name = "COMMAND")]
    pub formats: Vec<String>,
}

impl EditCommand {
    /// Whether the command changes anything.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.content_file.is_some()
            || !self.formats.is_empty()
    }
}

/// Attach command arguments.
#[derive(Debug, Args)]
pub struct AttachCommand {
    /// Page id, or a unique prefix of one
    pub id: String,

    /// Image file to upload and append
    pub image: PathBuf,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Page id, or a unique prefix of one
    pub id: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
