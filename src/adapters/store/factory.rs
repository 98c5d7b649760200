//! Record store factory
//!
//! Builds the record store named by the configuration.

use crate::adapters::store::json_file::JsonFileRecordStore;
use crate::adapters::store::traits::RecordStore;
use crate::config::schema::PackratConfig;
use crate::domain::Result;
use std::sync::Arc;

/// Create the record store described by the configuration
///
/// # Errors
///
/// Returns an error if the records file cannot be opened or parsed.
pub async fn create_record_store(config: &PackratConfig) -> Result<Arc<dyn RecordStore>> {
    tracing::info!(
        records_path = %config.store.records_path,
        "Opening JSON records file"
    );

    let store = JsonFileRecordStore::open(&config.store.records_path).await?;
    Ok(Arc::new(store) as Arc<dyn RecordStore>)
}
