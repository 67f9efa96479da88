//! # Document model
//!
//! The unit of persistence: a titled document with a description, keywords,
//! and an ordered list of chapters, each carrying direct content and/or
//! nested sections. Metadata records the creation and update timestamps and
//! the frozen on-disk filename.
//!
//! The filename is derived exactly once, at first save, from the title slug
//! plus a second-granularity timestamp. It is the document's identity for
//! load/delete lookups and is never recomputed, so renaming the title later
//! does not rename the file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A titled block of content inside a chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
}

/// One chapter of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Timestamps and the frozen storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub filename: String,
}

/// The unit of persistence.
///
/// `metadata` is `None` until the document has been saved once; the store
/// fills it in on first save and only refreshes `updated_at` afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl Document {
    /// Create an unsaved document.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            keywords: Vec::new(),
            chapters: Vec::new(),
            metadata: None,
        }
    }

    /// The frozen storage key, if this document has been saved.
    pub fn filename(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.filename.as_str())
    }
}

/// Lowercase the title, keep alphanumerics, and collapse whitespace runs
/// into single underscores. Everything else is dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for c in title.trim().chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else if c.is_whitespace() {
            pending_separator = true;
        }
    }

    slug
}

/// Derive the storage key for a title at a given instant:
/// `<slug>_<YYYYMMDD_HHMMSS>`.
pub fn derive_filename(title: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}", slugify(title), now.format("%Y%m%d_%H%M%S"))
}

/// Split a comma-separated keyword string, trimming entries and dropping
/// empty ones.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
