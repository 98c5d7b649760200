//! Record store abstraction layer
//!
//! The record store is the system of record for export eligibility and
//! outcome. Packrat talks to it only through the [`RecordStore`] trait.
//!
//! - [`traits`] - the trait and the shared [`StoredRecord`] model
//! - [`memory`] - in-memory store for programmatic use and tests
//! - [`json_file`] - store persisted as a JSON records file
//! - [`factory`] - builds the configured store

pub mod factory;
pub mod json_file;
pub mod memory;
pub mod traits;

pub use factory::create_record_store;
pub use json_file::JsonFileRecordStore;
pub use memory::InMemoryRecordStore;
pub use traits::{RecordStore, StoreResult, StoredRecord};
