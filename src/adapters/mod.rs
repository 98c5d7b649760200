//! External system integrations for Packrat.
//!
//! - [`store`] - record store abstraction and bundled implementations
//!
//! # Design Pattern
//!
//! Adapters isolate the originating record store behind a trait so the export
//! pipeline can run against a JSON records file, an in-memory store in tests,
//! or any other backend that implements [`store::RecordStore`].
//!
//! ```rust,no_run
//! use packrat::adapters::store::{JsonFileRecordStore, RecordStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = JsonFileRecordStore::open("records.json").await?;
//! let pending = store.fetch_pending_records().await?;
//! println!("{} record(s) pending", pending.len());
//! # Ok(())
//! # }
//! ```

pub mod store;
