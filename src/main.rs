//! comic-dl - crawl and serve numbered web comics

use clap::Parser;
use comic_dl::{BatchSummary, ComicDownloader, Config, ExistingPolicy, Result, Strategy};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "comic-dl")]
#[command(author, version, about = "Download every comic and optionally serve them over HTTP")]
struct Cli {
    /// Extraction strategy: json, html or regex
    #[arg(long, value_name = "STRATEGY")]
    parser: Option<Strategy>,

    /// Keep crawling past comics that are already stored
    #[arg(long)]
    download_all: bool,

    /// Number of parallel workers
    #[arg(short, long, env = "COMIC_DL_WORKERS")]
    workers: Option<usize>,

    /// Directory the comics are stored in
    #[arg(short, long, env = "COMIC_DL_DIR")]
    dir: Option<PathBuf>,

    /// Metadata source base URL
    #[arg(long, env = "COMIC_DL_BASE_URL")]
    base_url: Option<String>,

    /// Start the HTTP API and keep serving until interrupted
    #[arg(long)]
    serve: bool,

    /// API bind address
    #[arg(long, env = "COMIC_DL_BIND")]
    bind: Option<SocketAddr>,

    /// Skip the batch crawl (only useful with --serve)
    #[arg(long)]
    no_crawl: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::default();
        if let Some(strategy) = self.parser {
            config.download.strategy = strategy;
        }
        if self.download_all {
            config.download.existing_policy = ExistingPolicy::SkipAndContinue;
        }
        if let Some(workers) = self.workers {
            config.download.max_concurrent_downloads = workers;
        }
        if let Some(dir) = self.dir {
            config.download.download_dir = dir;
        }
        if let Some(base_url) = self.base_url {
            config.source.base_url = base_url;
        }
        if let Some(bind) = self.bind {
            config.api.bind_address = bind;
        }
        config
    }
}

fn log_summary(summary: &BatchSummary) {
    info!(
        stored = summary.stored,
        already_stored = summary.already_stored,
        skipped = summary.skipped,
        failed = summary.failed,
        stopped_at = summary.stopped_at.map(|id| id.get()),
        "Crawl complete"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let serve = cli.serve;
    let crawl = !cli.no_crawl;

    let downloader = ComicDownloader::new(cli.into_config()).await?;

    let server = serve.then(|| downloader.spawn_api_server());

    let batch: Option<JoinHandle<Result<BatchSummary>>> = crawl.then(|| {
        let downloader = downloader.clone();
        tokio::spawn(async move { downloader.run_batch().await })
    });

    match (batch, server) {
        (Some(batch), None) => {
            tokio::select! {
                joined = batch => {
                    let summary = joined.map_err(|e| comic_dl::Error::Other(e.to_string()))??;
                    log_summary(&summary);
                }
                stopped = comic_dl::run_with_shutdown(downloader.clone()) => stopped?,
            }
        }
        (batch, Some(server)) => {
            if let Some(batch) = batch {
                tokio::spawn(async move {
                    match batch.await {
                        Ok(Ok(summary)) => log_summary(&summary),
                        Ok(Err(e)) => tracing::error!(error = %e, "Crawl failed"),
                        Err(e) => tracing::error!(error = %e, "Crawl task panicked"),
                    }
                });
            }
            serve_until_signal(downloader, server).await?;
        }
        (None, None) => {
            info!("Nothing to do: --no-crawl without --serve");
        }
    }

    Ok(())
}

async fn serve_until_signal(
    downloader: ComicDownloader,
    mut server: JoinHandle<Result<()>>,
) -> Result<()> {
    tokio::select! {
        joined = &mut server => {
            // Server only returns on failure (e.g. address in use)
            downloader.shutdown().await?;
            return joined.map_err(|e| comic_dl::Error::Other(e.to_string()))?;
        }
        stopped = comic_dl::run_with_shutdown(downloader.clone()) => stopped?,
    }

    server.abort();
    Ok(())
}
