//! CLI module - Command-line interface for Ladle
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

use crate::domain::Difficulty;

/// Ladle - Recipe catalog service
#[derive(Parser)]
#[command(name = "ladle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API and the background orphan sweep (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Search recipes by title, difficulty, categories and tags
    #[command(alias = "s")]
    Search {
        /// Only recipes with this difficulty
        #[arg(long, short)]
        difficulty: Option<Difficulty>,

        /// Category id the recipe must carry (repeatable)
        #[arg(long = "category", short = 'c')]
        categories: Vec<String>,

        /// Tag id the recipe must carry (repeatable)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Title search term
        term: Vec<String>,
    },

    /// List all categories
    Categories,

    /// List all tags
    Tags,

    /// Delete stored images no recipe references
    Sweep,
}

pub use commands::*;
