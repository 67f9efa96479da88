//! # Document store
//!
//! Durable save and enumerable load of documents under a root directory,
//! one `<filename>.json` per document with the full nested structure and a
//! `metadata` block.
//!
//! Writes go through a temporary file in the same directory followed by an
//! atomic rename, so readers never observe a partially written document.
//! Loads are isolated per file: a corrupt document is reported alongside the
//! ones that parsed, not allowed to abort the whole enumeration.

use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::document::{Document, Metadata, derive_filename};

/// Errors raised by the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document title must not be empty")]
    EmptyTitle,

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A document file that failed to load.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of enumerating the store: every document that parsed, plus a
/// diagnostic entry per file that did not.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<Document>,
    pub failures: Vec<LoadFailure>,
}

/// File-backed document store rooted at one directory.
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Create a store over `root`. The directory is created if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist a document, returning its storage key.
    ///
    /// The title must be non-empty after trimming. On first save the
    /// filename and `created_at` are derived and frozen; if the derived
    /// filename is already taken (same title saved within the same second),
    /// a `_2`, `_3`, … suffix disambiguates rather than overwriting. On
    /// re-save only `updated_at` is refreshed and the existing file is
    /// replaced in place.
    ///
    /// # Parameters
    /// - `document`: The document to persist; its `metadata` is filled in
    ///   or refreshed as a side effect.
    ///
    /// # Returns
    /// - `Ok(String)`: The frozen filename key.
    /// - `Err(StoreError)`: Validation or I/O failure; nothing was written.
    pub fn save(&self, document: &mut Document) -> Result<String, StoreError> {
        if document.title.trim().is_empty() {
            return Err(StoreError::EmptyTitle);
        }

        let now = Utc::now();
        let filename = match document.metadata.as_mut() {
            Some(metadata) => {
                metadata.updated_at = now;
                metadata.filename.clone()
            }
            None => {
                let filename = self.unique_filename(&document.title);
                document.metadata = Some(Metadata {
                    created_at: now,
                    updated_at: now,
                    filename: filename.clone(),
                });
                filename
            }
        };
        let target = self.document_path(&filename);

        let json = serde_json::to_string_pretty(document)?;
        let mut temp = NamedTempFile::new_in(&self.root)?;
        temp.write_all(json.as_bytes())?;
        temp.persist(&target).map_err(|e| {
            error!("Error saving document {}: {}", target.display(), e.error);
            StoreError::Io(e.error)
        })?;

        info!("Saved document: {} ({filename})", document.title);
        Ok(filename)
    }

    /// Enumerate every `.json` file in the root, parsing each one
    /// independently.
    ///
    /// Successfully parsed documents are sorted by `created_at` ascending;
    /// files that fail to read or parse are collected into
    /// [`LoadOutcome::failures`] with the reason, and logged.
    pub fn load_all(&self) -> Result<LoadOutcome, StoreError> {
        let mut outcome = LoadOutcome::default();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match self.read_document(&path) {
                Ok(document) => outcome.documents.push(document),
                Err(err) => {
                    warn!("Skipping {}: {err}", path.display());
                    outcome.failures.push(LoadFailure {
                        path,
                        reason: err.to_string(),
                    });
                }
            }
        }

        outcome.documents.sort_by_key(|doc| {
            doc.metadata
                .as_ref()
                .map(|m| m.created_at)
                .unwrap_or_default()
        });

        info!(
            "Loaded {} document(s), {} failure(s)",
            outcome.documents.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }

    /// Load one document by its frozen filename key.
    pub fn load(&self, filename: &str) -> Result<Document, StoreError> {
        let path = self.document_path(filename);
        if !path.exists() {
            return Err(StoreError::NotFound(filename.to_string()));
        }
        self.read_document(&path)
    }

    /// Remove one document by its frozen filename key.
    pub fn delete(&self, filename: &str) -> Result<(), StoreError> {
        let path = self.document_path(filename);
        if !path.exists() {
            return Err(StoreError::NotFound(filename.to_string()));
        }
        fs::remove_file(&path)?;
        info!("Deleted document: {filename}");
        Ok(())
    }

    fn document_path(&self, filename: &str) -> PathBuf {
        self.root.join(format!("{filename}.json"))
    }

    fn read_document(&self, path: &Path) -> Result<Document, StoreError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    // Same title within the same second must not collide.
    fn unique_filename(&self, title: &str) -> String {
        let base = derive_filename(title, Utc::now());
        if !self.document_path(&base).exists() {
            return base;
        }

        let mut counter = 2;
        loop {
            let candidate = format!("{base}_{counter}");
            if !self.document_path(&candidate).exists() {
                return candidate;
            }
            counter += 1;
        }
    }
}
