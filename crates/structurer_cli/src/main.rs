//! `structurer`: extracts structured text from one or more web pages and
//! prints it as a marker-delimited stream or JSON.

mod cli;
mod output;
mod settings;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use futures_util::stream::{self, StreamExt};
use structurer_engine::Coordinator;
use structurer_logging::{structurer_error, structurer_info};

use crate::cli::{Args, OutputFormat};
use crate::output::Outcome;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let env = |name: &str| std::env::var(name).ok();
    structurer_logging::initialize(&settings::log_settings(&args, env));

    match run(&args, env).await {
        Ok(code) => code,
        Err(err) => {
            structurer_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run<F>(args: &Args, env: F) -> anyhow::Result<ExitCode>
where
    F: Fn(&str) -> Option<String>,
{
    let config = settings::engine_config(args, env)?;
    let coordinator = Coordinator::new(&config)?;
    structurer_info!(
        "Extracting {} page(s), {} at a time",
        args.urls.len(),
        args.concurrency
    );

    let outcomes: Vec<Outcome> = stream::iter(args.urls.iter())
        .map(|url| coordinator.extract(url))
        .buffered(usize::from(args.concurrency))
        .collect()
        .await;

    let mut stdout = std::io::stdout().lock();
    match args.format {
        OutputFormat::Text => {
            for outcome in &outcomes {
                match outcome {
                    Ok(doc) => writeln!(stdout, "{}", output::text_block(doc))?,
                    Err(err) => eprintln!("{err}"),
                }
            }
        }
        OutputFormat::Json => {
            let report = output::json_report(&outcomes).context("failed to serialize results")?;
            writeln!(stdout, "{report}")?;
        }
    }
    stdout.flush()?;

    let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
    structurer_info!("{} extracted, {} failed", outcomes.len() - failed, failed);
    Ok(if failed == outcomes.len() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
