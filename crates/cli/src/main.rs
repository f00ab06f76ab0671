//! RWA Guard CLI - Main entry point

use clap::{Parser, Subcommand};
use rwaguard_cli::{commands, AppContext};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rwaguard")]
#[command(about = "RWA Guard - Oracle-verified ownership guard for tokenized real-world assets", long_about = None)]
struct Cli {
    /// SQLite database with asset metadata and transfers
    #[arg(long, global = true, default_value = "./data/guard.db")]
    db: PathBuf,

    /// JSON config file (RWAGUARD_* environment variables override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Hash-chained JSONL audit ledger
    #[arg(long, global = true, default_value = "./data/audit.jsonl")]
    audit_log: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify ownership of one asset and print the result
    Verify {
        /// Asset ID
        asset_id: String,
        /// Current SPV controlling address (defaults to the asset's)
        #[arg(long, default_value = "")]
        spv: String,
    },

    /// Poll assets continuously until Ctrl-C
    Watch {
        /// Asset IDs
        #[arg(required = true)]
        asset_ids: Vec<String>,
        /// Polling interval in seconds (overrides config)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Print the audit trail
    Audit {
        /// Only entries for this asset
        #[arg(long)]
        asset: Option<String>,
        /// Verify the hash chain first
        #[arg(long)]
        verify_chain: bool,
    },

    /// Insert or replace asset metadata from a JSON file
    RegisterAsset {
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut ctx = AppContext::new(&cli.db, &cli.audit_log, cli.config.as_deref()).await?;

    match cli.command {
        Commands::Verify { asset_id, spv } => {
            let guard = ctx.orchestrator()?;
            commands::verify(&guard, &asset_id, &spv).await?;
        }

        Commands::Watch { asset_ids, interval } => {
            if let Some(secs) = interval {
                ctx.config.polling_interval_secs = secs;
            }
            let guard = ctx.orchestrator()?;
            commands::watch(&guard, &asset_ids).await?;
        }

        Commands::Audit { asset, verify_chain } => {
            commands::audit(&ctx, asset.as_deref(), verify_chain)?;
        }

        Commands::RegisterAsset { file } => {
            commands::register_asset(&ctx, &file).await?;
        }
    }

    Ok(())
}
