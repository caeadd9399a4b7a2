use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::reader::PageReader;
use crate::search::{self, SearchClient};

#[derive(Debug, Parser)]
#[command(name = "jina", about = "Read web pages and search the web through Jina.ai")]
pub struct Cli {
    /// Enable debug mode, output detailed logs
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read a web page as clean text
    Read(ReadArgs),
    /// Search the web
    Search(SearchArgs),
}

impl Command {
    pub fn cancel_message(&self) -> &'static str {
        match self {
            Command::Read(_) => "Operation cancelled",
            Command::Search(_) => "Search cancelled",
        }
    }
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// The web URL to read
    pub url: String,

    /// Jina.ai API token (defaults to JINA_API_TOKEN)
    #[arg(short, long)]
    pub token: Option<String>,

    /// Include page link summary
    #[arg(short = 'l', long)]
    pub extract_links: bool,

    /// Save content to the given file instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Maximum number of results
    #[arg(short = 'n', long, default_value_t = 10)]
    pub max_results: usize,

    /// Jina.ai API token (defaults to JINA_API_TOKEN)
    #[arg(short, long)]
    pub token: Option<String>,

    /// Restrict search to a specific website domain (e.g. https://cursor.com)
    #[arg(short, long)]
    pub site: Option<String>,

    /// Only search within the specified site
    #[arg(long)]
    pub site_search: bool,

    /// Output results as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Result page number
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,
}

pub async fn run(command: &Command, config: Config, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Read(args) => run_read(args, config, out).await,
        Command::Search(args) => run_search(args, config, out).await,
    }
}

pub async fn run_read(args: &ReadArgs, config: Config, out: &mut dyn Write) -> Result<()> {
    let config = config
        .with_token(args.token.clone())
        .with_timeout(args.timeout.map(Duration::from_secs));
    let reader = PageReader::new(&config);

    let page = match reader.fetch(&args.url, args.extract_links, config.timeout).await {
        Ok(page) => page,
        Err(e) => {
            log::error!("Request failed: {e}");
            log::error!("Unable to read web page: {}", args.url);
            return Err(e).with_context(|| format!("Unable to read web page: {}", args.url));
        }
    };

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &page.body)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Content saved to file: {}", path.display());
        }
        None => writeln!(out, "{}", page.body)?,
    }
    Ok(())
}

pub async fn run_search(args: &SearchArgs, config: Config, out: &mut dyn Write) -> Result<()> {
    let config = config.with_token(args.token.clone());

    if let Err(e) = search_and_print(args, &config, out).await {
        log::error!("Search failed: {e:#}");
        writeln!(out, "Search failed: {e:#}")?;
        writeln!(out, "\nYou can directly use the following link to search:")?;
        writeln!(
            out,
            "{}",
            search::fallback_search_url(&config.search_url, &args.query)
        )?;
        return Err(e);
    }
    Ok(())
}

async fn search_and_print(args: &SearchArgs, config: &Config, out: &mut dyn Write) -> Result<()> {
    let client = SearchClient::new(config, args.site.clone())
        .context("Failed to set up Jina.ai search client")?;

    let results = client
        .search(&args.query, args.max_results, args.page, args.site_search)
        .await;

    if args.json {
        let output = search::format_results(&args.query, results);
        writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        writeln!(out, "{}", search::render_results(&results))?;
    }
    Ok(())
}
