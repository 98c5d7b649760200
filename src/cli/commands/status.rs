//! Status command implementation
//!
//! This module implements the `status` command, which lists records in the
//! configured store grouped by lifecycle state.

use crate::adapters::store::create_record_store;
use crate::config::load_config;
use crate::domain::record::{ExportRecord, RecordState};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show records in this state (pending, processing, processed, errored)
    #[arg(long)]
    pub state: Option<RecordState>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking record status");

        println!("📊 Record Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let store = match create_record_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to open record store");
                println!("   Error: {e}");
                return Ok(4);
            }
        };

        let records = match store.get_all_records().await {
            Ok(r) => r,
            Err(e) => {
                println!("❌ Failed to load records");
                println!("   Error: {e}");
                return Ok(4);
            }
        };

        if records.is_empty() {
            println!("No records found in {}.", config.store.records_path);
            return Ok(0);
        }

        let counts = count_by_state(&records);
        println!(
            "Pending: {}  Processing: {}  Processed: {}  Errored: {}",
            counts[0], counts[1], counts[2], counts[3]
        );
        println!();

        let filtered = filter_records(&records, self.state);
        if filtered.is_empty() {
            println!("No records match the specified filter.");
            return Ok(0);
        }

        println!(
            "{:<12} {:<20} {:<20} {:<12} {}",
            "Record ID", "Type", "Account", "State", "Error"
        );
        println!("{}", "-".repeat(100));

        for record in filtered {
            let status = match record.state {
                RecordState::Processed => "✅ processed",
                RecordState::Processing => "🔄 processing",
                RecordState::Errored => "❌ errored",
                RecordState::Pending => "⏸️  pending",
            };
            println!(
                "{:<12} {:<20} {:<20} {:<12} {}",
                record.id,
                record.record_type,
                record.account_id,
                status,
                record.error_message.as_deref().unwrap_or("")
            );
        }

        println!();
        Ok(0)
    }
}

/// Number of records per state, in lifecycle order
fn count_by_state(records: &[ExportRecord]) -> [usize; 4] {
    let mut counts = [0; 4];
    for record in records {
        let slot = match record.state {
            RecordState::Pending => 0,
            RecordState::Processing => 1,
            RecordState::Processed => 2,
            RecordState::Errored => 3,
        };
        counts[slot] += 1;
    }
    counts
}

fn filter_records(records: &[ExportRecord], state: Option<RecordState>) -> Vec<&ExportRecord> {
    records
        .iter()
        .filter(|r| state.map_or(true, |s| r.state == s))
        .collect()
}
