use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use grovefs_client::{FsClient, LocalFsClient, LogProgressChannel};
use grovefs_lifecycle::{
    clone_stats, format_count, ConcurrencyLimits, ProgressReporter, PurgeProgressSource,
    RateMonitor, ReporterConfig, TrashCan, VolumeSpec,
};
use grovefs_logging::LogConfig;
use grovefs_types::VolumeName;

/// grovefs lifecycle administration tool
///
/// Inspects and drives the deferred-deletion (trash/purge) machinery of a
/// grovefs namespace and watches aggregate progress of background jobs.
#[derive(Parser, Debug)]
#[command(name = "grovefs-admin", version, about)]
struct Cli {
    /// Base directory of the cluster namespace.
    #[arg(long)]
    base_dir: PathBuf,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect or reclaim trashed subvolumes.
    Trash {
        #[command(subcommand)]
        command: TrashCommands,
    },

    /// Publish purge progress to the log until interrupted.
    Watch {
        /// Concurrency limit of the purge worker pool.
        #[arg(long, default_value_t = 4)]
        max_concurrent_purges: usize,
    },

    /// Show copy statistics for one clone source/destination pair.
    CloneStats {
        /// Source snapshot data path.
        src: PathBuf,
        /// Destination data path of the in-progress clone.
        dst: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum TrashCommands {
    /// Show what remains in a volume's trash.
    Stats {
        /// Volume name.
        volume: String,
    },

    /// Reclaim all trash entries of a volume, oldest first. Ctrl-C cancels
    /// between namespace operations, leaving entries resumable.
    Reclaim {
        /// Volume name.
        volume: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: if cli.verbose { "debug".into() } else { "info".into() },
        ..LogConfig::default()
    };
    let _log_guard = grovefs_logging::init_logging(&log_config);

    let fs: Arc<dyn FsClient> = Arc::new(LocalFsClient::new());
    let spec = VolumeSpec::new(&cli.base_dir);

    match cli.command {
        Commands::Trash { command } => run_trash(command, fs, &spec).await,
        Commands::Watch {
            max_concurrent_purges,
        } => run_watch(fs, spec, max_concurrent_purges).await,
        Commands::CloneStats { src, dst } => {
            let stats = clone_stats(fs.as_ref(), &src, &dst).await?;
            println!("{}", stats.report());
            Ok(())
        }
    }
}

async fn run_trash(
    command: TrashCommands,
    fs: Arc<dyn FsClient>,
    spec: &VolumeSpec,
) -> anyhow::Result<()> {
    match command {
        TrashCommands::Stats { volume } => {
            let volume = VolumeName::from(volume);
            let trash = TrashCan::open(fs, spec, &volume).await?;
            let stats = trash.stats().await?;
            if stats.is_empty() {
                println!("trash of volume '{}' is empty", volume);
            } else {
                println!(
                    "volume '{}': {} subvolumes, {} namespace objects left to purge",
                    volume,
                    format_count(stats.subvols_left),
                    format_count(stats.files_left),
                );
            }
            Ok(())
        }

        TrashCommands::Reclaim { volume } => {
            let volume = VolumeName::from(volume);
            let trash = TrashCan::open(fs, spec, &volume).await?;

            let cancelled = Arc::new(AtomicBool::new(false));
            {
                let cancelled = cancelled.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Cancellation requested, stopping after current operation");
                        cancelled.store(true, Ordering::SeqCst);
                    }
                });
            }
            let should_cancel = move || cancelled.load(Ordering::SeqCst);

            let config = ReporterConfig::default();
            let rate = RateMonitor::new(config.rate_sample_period);

            let mut reclaimed = 0usize;
            for entry in trash.entries_by_ctime().await? {
                match trash.reclaim(&entry.name, &should_cancel, &rate).await {
                    Ok(()) => reclaimed += 1,
                    Err(status) if status.is_interrupted() => {
                        println!(
                            "cancelled after {} entries; remaining entries are resumable",
                            reclaimed
                        );
                        return Ok(());
                    }
                    Err(status) => return Err(status.into()),
                }
            }

            println!(
                "reclaimed {} entries ({:.1} objects/s at last sample)",
                reclaimed,
                rate.rate()
            );
            Ok(())
        }
    }
}

async fn run_watch(
    fs: Arc<dyn FsClient>,
    spec: VolumeSpec,
    max_concurrent_purges: usize,
) -> anyhow::Result<()> {
    let limits = Arc::new(ConcurrencyLimits::new(4, max_concurrent_purges));
    let source = Arc::new(PurgeProgressSource::new(fs, spec, limits));
    let channel = Arc::new(LogProgressChannel::new());
    let reporter = ProgressReporter::new(source, channel, ReporterConfig::default());

    reporter.initiate_reporting();
    println!("watching purge progress; Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    reporter.shutdown().await;
    Ok(())
}
