//! vcache — exercise the cache against a JSON fixture store.
//!
//! Every fetch against the fixture can be slowed down with `--latency-ms`
//! to make cache hits, expiry and single-flight behaviour visible.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use futures_util::future::join_all;
use tracing::info;

use vault_cache::{Artifact, ArtifactKind, CacheConfig, FileSource, VaultCache};

/// vault-cache harness
#[derive(Parser)]
#[command(name = "vcache")]
#[command(version = vault_cache::PKG_VERSION)]
#[command(about = "Drive the vault cache against a JSON fixture store")]
struct Args {
    /// Fixture file holding secrets, certificates and keys.
    #[arg(short, long, env = "VCACHE_STORE")]
    store: PathBuf,

    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated latency per store fetch, in milliseconds.
    #[arg(long, default_value_t = 250)]
    latency_ms: u64,

    /// Override the configured caching duration, in seconds (0 = no expiry).
    #[arg(long)]
    ttl_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read an artifact one or more times, timing each read
    Get {
        /// secret, certificate or key
        kind: ArtifactKind,
        name: String,
        /// Bypass the cache on the first read
        #[arg(long)]
        refetch: bool,
        /// Number of reads
        #[arg(short, long, default_value_t = 2)]
        repeat: u32,
        /// Pause between reads, in milliseconds
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
    },

    /// Issue many concurrent reads of one uncached artifact
    Burst {
        kind: ArtifactKind,
        name: String,
        /// Number of concurrent callers
        #[arg(long, default_value_t = 16)]
        callers: usize,
    },

    /// Read an artifact, remove it, and read it again
    Remove { kind: ArtifactKind, name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let mut config = CacheConfig::load(args.config.as_deref())?;
    if let Some(secs) = args.ttl_secs {
        config = config.caching_duration_secs(secs);
    }

    let source =
        Arc::new(FileSource::load(&args.store)?.with_latency(Duration::from_millis(args.latency_ms)));
    let cache = VaultCache::builder()
        .source(source.clone())
        .config(config)
        .build()?;

    info!(version = vault_cache::PKG_VERSION, store = %args.store.display(), "vcache starting");

    match args.command {
        Command::Get {
            kind,
            name,
            refetch,
            repeat,
            interval_ms,
        } => {
            for i in 0..repeat {
                if i > 0 && interval_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                }
                let force = refetch && i == 0;
                let start = Instant::now();
                let artifact = cache.coordinator().get_artifact(&name, kind, force).await?;
                println!(
                    "read {}: {} in {:.1} ms",
                    i + 1,
                    describe(&artifact),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
        }

        Command::Burst {
            kind,
            name,
            callers,
        } => {
            let start = Instant::now();
            let reads = (0..callers).map(|_| cache.coordinator().get_artifact(&name, kind, false));
            let results = join_all(reads).await;
            let failed = results.iter().filter(|r| r.is_err()).count();
            println!(
                "{callers} callers finished in {:.1} ms, {failed} failed",
                start.elapsed().as_secs_f64() * 1000.0
            );
        }

        Command::Remove { kind, name } => {
            cache.coordinator().get_artifact(&name, kind, false).await?;
            cache.remove(&name).await;
            let start = Instant::now();
            cache.coordinator().get_artifact(&name, kind, false).await?;
            println!(
                "read after removal took {:.1} ms",
                start.elapsed().as_secs_f64() * 1000.0
            );
        }
    }

    println!("store fetches: {}", source.fetch_count());
    Ok(())
}

/// One-line summary that never prints secret material.
fn describe(artifact: &Artifact) -> String {
    match artifact {
        Artifact::Secret(b) => format!("secret {} ({} chars)", b.id, b.value.chars().count()),
        Artifact::Certificate(b) => format!("certificate {} ({} bytes)", b.id, b.cer.len()),
        Artifact::Key(b) => format!("key {} ({})", b.id, b.key.kty),
    }
}
