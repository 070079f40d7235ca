//! Command-line interface for pagenotes.
//!
//! This module provides the CLI structure for the `pagenotes` binary and the
//! terminal implementation of [`Interaction`](crate::interaction::Interaction).

mod commands;
mod terminal;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AttachCommand, ConfigCommand, DeleteCommand, EditCommand, ListCommand, ShowCommand,
};
pub use terminal::TerminalInteraction;

/// pagenotes - Page-based notes with autosave
///
/// Keeps a list of rich-text pages, newest first. Edits are saved once the
/// page has been left alone for a moment; images are uploaded and appended
/// to a page's content.
#[derive(Debug, Parser)]
#[command(name = "pagenotes")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List pages, most recently updated first
    List(ListCommand),

    /// Create a new page
    New,

    /// Show a page
    Show(ShowCommand),

    /// Change a page's title or content
    Edit(EditCommand),

    /// Upload an image and append it to a page
    Attach(AttachCommand),

    /// Delete a page
    Delete(DeleteCommand),

    /// Sign out of the current account
    SignOut,

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
