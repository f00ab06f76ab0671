//! CLI commands

use std::path::Path;
use std::sync::Arc;

use rwaguard_audit::LedgerRecord;
use rwaguard_bus::{spawn_subscriber, LoggingAlertSubscriber};
use rwaguard_core::{Asset, OwnershipVerification};
use rwaguard_guard::OwnershipVerificationOrchestrator;

use crate::context::AppContext;

/// Run one verification and print the result as JSON
pub async fn verify(
    guard: &OwnershipVerificationOrchestrator,
    asset_id: &str,
    spv_address: &str,
) -> Result<OwnershipVerification, anyhow::Error> {
    let result = guard.verify_ownership(asset_id, spv_address).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result)
}

/// Poll assets until Ctrl-C; alerts go to the log
pub async fn watch(
    guard: &OwnershipVerificationOrchestrator,
    asset_ids: &[String],
) -> Result<(), anyhow::Error> {
    let listener = spawn_subscriber(guard.alerts(), Arc::new(LoggingAlertSubscriber));

    for asset_id in asset_ids {
        if let Some(first) = guard.start_continuous_polling(asset_id, "").await {
            println!(
                "👁️  {} {} (score {}, action {})",
                first.asset_id, first.ownership_status, first.oracle_score, first.recommended_action
            );
        }
    }

    println!(
        "Watching {} asset(s) every {}s, Ctrl-C to stop",
        guard.polling_assets().len(),
        guard.config().polling_interval_secs
    );
    tokio::signal::ctrl_c().await?;

    let stopped = guard.stop_all_polling();
    listener.abort();
    println!("✅ Stopped polling {} asset(s)", stopped);
    Ok(())
}

/// Print the audit trail, optionally verifying the hash chain first
///
/// Returns the number of records printed.
pub fn audit(ctx: &AppContext, asset_id: Option<&str>, verify_chain: bool) -> Result<usize, anyhow::Error> {
    if verify_chain {
        match ctx.ledger.verify_chain() {
            Ok(count) => println!("✅ Hash chain verified ({} entries)", count),
            Err(e) => {
                println!("❌ Hash chain broken: {}", e);
                return Ok(0);
            }
        }
    }

    let records: Vec<LedgerRecord> = ctx
        .ledger
        .read_all()?
        .into_iter()
        .filter(|r| asset_id.map_or(true, |id| r.entry.asset_id == id))
        .collect();

    for record in &records {
        let entry = &record.entry;
        println!(
            "#{:<5} {} {:<12} {:<12} score={:<5} action={} flags={}",
            record.sequence,
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.asset_id,
            entry.decision.to_string(),
            entry.risk_score.to_string(),
            entry.reasoning.recommended_action,
            entry.reasoning.flags.len()
        );
        for flag in &entry.reasoning.flags {
            println!("        - {}", flag);
        }
    }

    if records.is_empty() {
        println!("No audit entries");
    }
    Ok(records.len())
}

/// Insert or replace asset metadata from a JSON file
pub async fn register_asset(ctx: &AppContext, file: &Path) -> Result<Asset, anyhow::Error> {
    let raw = std::fs::read_to_string(file)?;
    let asset: Asset = serde_json::from_str(&raw)?;
    if asset.asset_id.trim().is_empty() {
        anyhow::bail!("asset_id must not be empty");
    }

    ctx.db.assets().upsert(&asset).await?;
    println!("✅ Registered {} ({})", asset.asset_id, asset.jurisdiction);
    Ok(asset)
}
