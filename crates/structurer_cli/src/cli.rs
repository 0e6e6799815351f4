use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Extract structured, marker-delimited text from web pages.
#[derive(Parser, Debug)]
#[command(name = "structurer")]
#[command(version)]
#[command(about = "Extract tables, lists, headings and paragraphs from web pages")]
pub struct Args {
    /// Pages to extract
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,

    /// RON file with engine settings
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Network timeout in seconds (capped at 10)
    #[arg(short, long, value_name = "SECS", value_parser = parse_seconds)]
    pub timeout: Option<f64>,

    /// How many pages to extract at the same time
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Keep the longest content region over all selectors instead of the
    /// first selector that matches
    #[arg(long)]
    pub full_scan: bool,

    /// Also write the log to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn parse_seconds(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(secs),
        _ => Err(format!("expected a positive number of seconds, got {raw:?}")),
    }
}
