//! Shared fixtures for integration tests

#![allow(dead_code)]

use packrat::adapters::store::{InMemoryRecordStore, RecordStore, StoredRecord};
use packrat::core::export::{run_export, ExportOptions, PipelineResult};
use packrat::domain::{AccountId, ExportRecord, RecordId};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

/// Source files, an output directory and an in-memory store
pub struct Fixture {
    pub source: TempDir,
    pub output: TempDir,
    pub store: Arc<InMemoryRecordStore>,
    pub records: Vec<ExportRecord>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            source: TempDir::new().unwrap(),
            output: TempDir::new().unwrap(),
            store: Arc::new(InMemoryRecordStore::new()),
            records: Vec::new(),
        }
    }

    /// Writes a source file and returns its reference
    pub fn file(&self, relative: &str, data: &[u8]) -> String {
        let path = self.source.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, data).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Reference to a file that is never created
    pub fn absent(&self, relative: &str) -> String {
        self.source
            .path()
            .join(relative)
            .to_string_lossy()
            .into_owned()
    }

    pub async fn record(&mut self, id: i64, refs: Vec<String>) {
        let record = ExportRecord::new(
            RecordId::new(id),
            "invoice",
            AccountId::new("acct-001").unwrap(),
        );
        self.store
            .insert(StoredRecord::new(record.clone(), refs))
            .await;
        self.records.push(record);
    }

    pub fn options(&self) -> ExportOptions {
        ExportOptions::new(self.output.path(), "run")
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output.path().join(name)
    }

    pub async fn run(&self, options: ExportOptions) -> PipelineResult {
        let (_tx, rx) = watch::channel(false);
        let store: Arc<dyn RecordStore> = self.store.clone();
        run_export(store, self.records.clone(), options, rx)
            .await
            .unwrap()
    }
}

/// Reads every entry of a zip archive as (name, contents), in archive order
pub fn read_archive(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        entries.push((entry.name().to_string(), data));
    }
    entries
}

/// Names of all files in a directory, sorted
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
