//! Query-by-example command handlers.

use std::sync::Arc;

use clap::Args;
use color_eyre::Result;
use futures::TryStreamExt;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::config::Config;
use crate::domain::{Order, Pageable, Sort};
use crate::graph::backends::neo4j::Neo4jClient;
use crate::operations::GraphTemplate;
use crate::query::{Example, ExampleMatcher, ReactiveFluentQuery, StringMatcher};
use crate::repositories::ReactiveQueryByExampleExecutor;

use super::App;

type Executor = ReactiveQueryByExampleExecutor<GraphTemplate<Neo4jClient>>;
type Fluent = ReactiveFluentQuery<GraphTemplate<Neo4jClient>, JsonValue>;

/// Options shared by every query subcommand.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Mapped entity to query
    #[arg(short, long)]
    pub entity: String,

    /// Probe as a JSON object; null fields are unset
    #[arg(short, long, default_value = "{}")]
    pub probe: String,

    /// Probe paths to ignore (repeatable)
    #[arg(long = "ignore")]
    pub ignore: Vec<String>,

    /// Match if any condition holds instead of all
    #[arg(long)]
    pub any: bool,

    /// Match null probe fields with IS NULL
    #[arg(long)]
    pub include_nulls: bool,

    /// String matching: default, exact, starting, ending, containing, regex
    #[arg(long, value_parser = parse_string_matcher, default_value = "default")]
    pub string_matcher: StringMatcher,

    /// Compare strings case-insensitively
    #[arg(long)]
    pub ignore_case: bool,

    /// Sort property, `-` prefix for descending (repeatable)
    #[arg(long = "sort", value_parser = parse_order, allow_hyphen_values = true)]
    pub sort: Vec<Order>,

    /// Property paths to return (repeatable); all when omitted
    #[arg(long = "project")]
    pub project: Vec<String>,

    /// Zero-based page to fetch
    #[arg(long)]
    pub page: Option<u64>,

    /// Page size
    #[arg(long, default_value = "20")]
    pub size: u64,
}

fn parse_string_matcher(value: &str) -> std::result::Result<StringMatcher, String> {
    value.parse().map_err(|e: crate::error::AppError| e.to_string())
}

fn parse_order(value: &str) -> std::result::Result<Order, String> {
    value.parse().map_err(|e: crate::error::AppError| e.to_string())
}

impl QueryArgs {
    /// Builds the example described by the arguments.
    pub fn example(&self) -> Result<Example<JsonValue>> {
        let probe: JsonValue = serde_json::from_str(&self.probe)?;

        let mut matcher = if self.any {
            ExampleMatcher::matching_any()
        } else {
            ExampleMatcher::matching_all()
        }
        .with_ignore_paths(&self.ignore)
        .with_string_matcher(self.string_matcher)
        .with_ignore_case(self.ignore_case);
        if self.include_nulls {
            matcher = matcher.with_include_null_values();
        }

        Ok(Example::dynamic(&self.entity, probe, matcher)?)
    }

    /// Applies sort and projection to a fluent query.
    fn refine(&self, query: Fluent) -> Fluent {
        let query = query.sort_by(Sort::by(self.sort.iter().cloned()));
        if self.project.is_empty() {
            query
        } else {
            query.project(self.project.iter().cloned())
        }
    }
}

impl App {
    pub async fn run_find(&self, args: &QueryArgs) -> Result<()> {
        let executor = connect().await?;
        let example = args.example()?;

        match args.page {
            Some(page) => {
                let pageable = Pageable::of(page, args.size);
                let page = executor
                    .find_by(example, |q| args.refine(q).page(pageable))?
                    .await?;
                tracing::info!(
                    "Page {} of {} ({} total)",
                    page.number + 1,
                    page.total_pages(),
                    page.total
                );
                print_json(&page)
            }
            None => {
                let results: Vec<JsonValue> = executor
                    .find_by(example, |q| args.refine(q).all())?
                    .try_collect()
                    .await?;
                tracing::info!("Found {} result(s)", results.len());
                print_json(&results)
            }
        }
    }

    pub async fn run_one(&self, args: &QueryArgs) -> Result<()> {
        let executor = connect().await?;
        let result = executor
            .find_by(args.example()?, |q| args.refine(q).one())?
            .await?;
        print_json(&result)
    }

    pub async fn run_count(&self, args: &QueryArgs) -> Result<()> {
        let executor = connect().await?;
        let total = executor.count(&args.example()?).await?;
        print_json(&total)
    }

    pub async fn run_exists(&self, args: &QueryArgs) -> Result<()> {
        let executor = connect().await?;
        let exists = executor.exists(&args.example()?).await?;
        print_json(&exists)
    }
}

/// Loads configuration and builds an executor over Neo4j.
async fn connect() -> Result<Executor> {
    let config = Config::load()?;
    let mapping = Arc::new(config.mapping.context()?);
    tracing::info!("Loaded {} entity mapping(s)", config.mapping.entities.len());

    tracing::info!("Connecting to Neo4j at {}", config.neo4j.uri);
    let client = Neo4jClient::connect(&config.neo4j).await?;

    Ok(ReactiveQueryByExampleExecutor::new(
        Arc::new(GraphTemplate::with_cypher(client)),
        mapping,
    ))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
