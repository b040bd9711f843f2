use crate::config::Config;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI entry point so users can run scans from the command line.
/// Exit codes: 0=success, 1=scan or output failure
#[derive(Parser, Debug)]
#[command(name = "sitemap-scanner")]
#[command(about = "Resolve an e-commerce sitemap into classified page URLs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a sitemap (or sitemap index) and classify the discovered URLs.
    Scan {
        #[arg(help = "Sitemap URL or bare domain (sitemap.xml is appended)")]
        url: String,

        #[arg(long, help = "Also scrape page details for product/category/blog URLs")]
        advanced: bool,

        #[arg(
            short,
            long,
            default_value_t = Config::MAX_CONCURRENT_FETCHES,
            help = "Maximum concurrent fetches"
        )]
        concurrency: usize,

        #[arg(
            short,
            long,
            default_value_t = Config::FETCH_TIMEOUT_SECS,
            help = "Per-fetch timeout in seconds"
        )]
        timeout: u64,

        #[arg(
            long,
            default_value_t = Config::SCAN_DEADLINE_SECS,
            help = "Wall-clock budget for the whole scan in seconds"
        )]
        deadline: u64,

        #[arg(
            short,
            long,
            default_value_t = Config::MAX_LEAF_URLS,
            help = "Cap on collected URLs (result is marked truncated beyond it)"
        )]
        limit: usize,

        #[arg(
            short,
            long,
            default_value = Config::USER_AGENT,
            help = "User agent string for requests"
        )]
        user_agent: String,

        #[arg(
            short,
            long,
            value_enum,
            default_value_t = OutputFormat::Summary,
            help = "Output format"
        )]
        format: OutputFormat,

        #[arg(short, long, help = "Write output to a file instead of stdout")]
        output: Option<PathBuf>,

        #[arg(long, help = "Directory for rotated log files")]
        log_dir: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Summary,
}
