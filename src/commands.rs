//! This module defines the command-line interface for the application using
//! `clap`.
//!
//! It provides a `Cli` struct that represents the parsed command-line
//! arguments, and a `Commands` enum that represents the available
//! subcommands and their options.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Represents the parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true, color = clap::ColorChoice::Always)]
pub struct Cli {
    /// The parsed subcommand and its options.
    #[command(subcommand)]
    pub command: Commands,
}

/// Represents the available subcommands and their options.
#[derive(Subcommand, Debug)]
#[command(about, long_about = None, color = clap::ColorChoice::Always)]
pub enum Commands {
    /// Rewrite a draft for clarity and conciseness.
    ///
    /// Reads the draft from FILE, or from stdin when no file is given.
    #[clap(name = "improve", alias = "imp")]
    Improve {
        /// File containing the draft to improve.
        file: Option<PathBuf>,
    },

    /// Get structured feedback on a draft's organization and clarity.
    #[clap(name = "analyze", alias = "an")]
    Analyze {
        /// File containing the draft to analyze.
        file: Option<PathBuf>,
    },

    /// Chat with the assistant about your writing; context accumulates
    /// until you type `/clear` or exit.
    #[clap(name = "chat", alias = "c")]
    Chat,

    /// List saved documents, newest last.
    #[clap(name = "list", alias = "ls")]
    List,

    /// Create and save a new document.
    #[clap(name = "new", alias = "n")]
    New {
        /// Title of the document.
        title: String,

        /// Short description.
        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Comma-separated keywords.
        #[arg(long, short = 'k')]
        keywords: Option<String>,

        /// File whose contents become the first chapter; stdin when absent.
        #[arg(long, short = 'c')]
        content: Option<PathBuf>,
    },

    /// Create the config file, prompt templates, and document directory.
    Init,
}
