//! In-memory document store.
//!
//! Holds the ingested knowledge base for the lifetime of the session. The
//! store itself performs no deduplication: sync runs the `(name, byte_size)`
//! fingerprint check *before* extraction (see [`crate::ingest`]) so that
//! already-present files are never re-extracted.

use crate::models::Document;

/// Ordered, append-only collection of ingested documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of documents. The batch is committed as a whole;
    /// callers never observe a partially applied batch.
    pub fn add(&mut self, batch: Vec<Document>) {
        self.documents.extend(batch);
    }

    /// Remove all documents unconditionally. User confirmation, if any,
    /// happens upstream.
    pub fn clear(&mut self) {
        self.documents.clear();
    }

    /// Documents in insertion order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Whether a document with the same `(name, byte_size)` fingerprint is
    /// already present. This is the coarse sync identity check: contents are
    /// not hashed, so a modified file with equal name and size is treated as
    /// unchanged.
    pub fn contains(&self, name: &str, byte_size: usize) -> bool {
        self.documents
            .iter()
            .any(|d| d.name == name && d.byte_size == byte_size)
    }

    /// Total character count across all stored content. Display/estimation
    /// aid only, never enforced as a limit.
    pub fn total_chars(&self) -> usize {
        self.documents.iter().map(|d| d.content.chars().count()).sum()
    }
}
