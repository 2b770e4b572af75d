//! CLI module for graphqbe.
//!
//! Subcommands:
//! - `find`: List matches of an example, optionally sorted, projected or paged
//! - `one`: Fetch the single match of an example
//! - `count`: Count matches of an example
//! - `exists`: Check whether an example has any match

mod query;

use clap::{Parser, Subcommand};

pub use query::QueryArgs;

/// graphqbe - Query by Example for Neo4j
#[derive(Parser)]
#[command(name = "graphqbe")]
#[command(about = "Query a Neo4j graph by example")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List all matches of an example
    Find(QueryArgs),

    /// Fetch the only match of an example
    One(QueryArgs),

    /// Count the matches of an example
    Count(QueryArgs),

    /// Check whether an example has at least one match
    Exists(QueryArgs),
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match &self.command {
            Command::Find(args) => self.run_find(args).await,
            Command::One(args) => self.run_one(args).await,
            Command::Count(args) => self.run_count(args).await,
            Command::Exists(args) => self.run_exists(args).await,
        }
    }
}
