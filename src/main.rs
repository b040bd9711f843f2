use clap::Parser;
use sitemap_scanner::cli::{Cli, Commands, OutputFormat};
use sitemap_scanner::export;
use sitemap_scanner::fetch_queue::{FetchQueue, FetchQueueConfig};
use sitemap_scanner::logging::init_logging;
use sitemap_scanner::network::HttpClient;
use sitemap_scanner::resolver::{ResolveError, ResolverConfig, SitemapResolver};
use sitemap_scanner::url_utils::normalize_scan_url;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MainError {
    #[error("Scan error: {0}")]
    Scan(#[from] ResolveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Setup error: {0}")]
    Setup(String),
}

/// Wire concrete components together for one scan
fn build_resolver(
    user_agent: &str,
    timeout: u64,
    concurrency: usize,
    limit: usize,
    deadline: u64,
    advanced: bool,
) -> SitemapResolver {
    let client = Arc::new(HttpClient::new(user_agent, timeout));

    let queue_config = FetchQueueConfig {
        max_concurrent: concurrency,
        ..FetchQueueConfig::default()
    };
    let queue = Arc::new(FetchQueue::with_config(queue_config));

    let resolver_config = ResolverConfig {
        max_urls: limit,
        advanced,
        deadline: Duration::from_secs(deadline),
        ..ResolverConfig::default()
    };

    SitemapResolver::with_config(client, queue, resolver_config)
}

fn write_output(
    result: &sitemap_scanner::ResolutionResult,
    format: OutputFormat,
    output: Option<&PathBuf>,
) -> Result<(), MainError> {
    let mut writer: Box<dyn std::io::Write> = match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };

    match format {
        OutputFormat::Json => export::write_json(result, &mut writer)?,
        OutputFormat::Csv => export::write_csv(result, &mut writer)?,
        OutputFormat::Summary => write!(writer, "{}", export::render_summary(result))?,
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), MainError> {
    match cli.command {
        Commands::Scan {
            url,
            advanced,
            concurrency,
            timeout,
            deadline,
            limit,
            user_agent,
            format,
            output,
            log_dir,
        } => {
            let _log_guard = init_logging(log_dir.as_deref())
                .map_err(|e| MainError::Setup(e.to_string()))?;

            let resolver =
                build_resolver(&user_agent, timeout, concurrency, limit, deadline, advanced);

            let scan_url = normalize_scan_url(&url);
            let result = resolver.resolve(&scan_url).await?;

            write_output(&result, format, output.as_ref())?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
