use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vlb")]
#[command(about = "Match tracker: reconcile stored matches and rebuild the leaderboard", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (later overrides earlier)
    #[arg(
        long = "config",
        global = true,
        env = "VLB_CONFIG",
        value_delimiter = ',',
        default_value = "config/base.yaml"
    )]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch recent matches, persist unseen ones, advance the watermark and
    /// rebuild the leaderboard. Safe to re-run after any failure.
    Reconcile {
        /// Print the full run outcome as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Recompute the leaderboard from stored matches only
    RebuildLeaderboard,

    /// Store access, rate limit, documents and watermark
    Status,

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// List stored matches, newest first
    Summary {
        /// Maximum number of matches to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Suggest balanced teams from the stored leaderboard
    Teams,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist; cron environments inject env vars directly.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    let paths: Vec<&str> = cli.config_paths.iter().map(String::as_str).collect();

    match cli.cmd {
        Commands::Reconcile { json } => commands::run::reconcile(&paths, json).await,
        Commands::RebuildLeaderboard => commands::run::rebuild_leaderboard(&paths).await,
        Commands::Status => commands::report::status(&paths).await,
        Commands::ConfigHash { paths } => {
            let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
            let loaded = vlb_config::load_layered_yaml(&refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
            Ok(())
        }
        Commands::Summary { limit } => commands::report::summary(&paths, limit).await,
        Commands::Teams => commands::report::teams(&paths).await,
    }
}

/// Logs go to stderr so `key=value` output on stdout stays parseable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
