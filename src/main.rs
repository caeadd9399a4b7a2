use std::process::ExitCode;

use clap::Parser;
use jina_tools::Config;
use jina_tools::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // stdout carries the page/results, logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    log::debug!("Debug mode enabled");

    let config = match std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|dir| Config::load(dir).map_err(anyhow::Error::from))
    {
        Ok(config) => config,
        Err(e) => {
            log::error!("An error occurred: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = std::io::stdout();
    tokio::select! {
        res = cli::run(&cli.command, config, &mut stdout) => match res {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::debug!("command failed: {e:#}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\n{}", cli.command.cancel_message());
            ExitCode::FAILURE
        }
    }
}
