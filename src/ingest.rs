//! Ingestion pipeline: raw uploaded files → document store entries.
//!
//! Sync flow: dedup against the store by `(name, byte_size)` *before* any
//! extraction work, fan out extraction over the remaining files, then commit
//! the whole batch atomically. A failed extraction never aborts the batch;
//! it yields a placeholder document carrying the Italian error marker so the
//! failure stays visible in the knowledge base listing.

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::extract::TextExtractor;
use crate::models::{Document, DocumentKind, UploadedFile};
use crate::prompts::extraction_placeholder;
use crate::store::DocumentStore;

/// Outcome counts of one sync batch, for status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Documents appended to the store (placeholders included).
    pub added: usize,
    /// Files skipped because an identical `(name, byte_size)` entry exists.
    pub skipped: usize,
    /// Subset of `added` whose extraction failed (placeholder content).
    pub failed: usize,
}

/// One extraction result: the document (real content or placeholder) plus
/// whether extraction failed.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub document: Document,
    pub failed: bool,
}

/// Fan out extraction over a batch of files and join the results, in input
/// order. One file's failure never aborts the rest; it yields a placeholder
/// document instead.
pub async fn extract_batch(
    extractor: &dyn TextExtractor,
    files: Vec<UploadedFile>,
) -> Vec<Extracted> {
    join_all(files.into_iter().map(|file| async move {
        let kind = DocumentKind::from_name(&file.name);
        let byte_size = file.byte_size();
        match extractor.extract(kind, &file.bytes) {
            Ok(content) => Extracted {
                document: Document::new(file.name, kind, byte_size, content),
                failed: false,
            },
            Err(err) => {
                warn!(name = %file.name, error = %err, "extraction failed, storing placeholder");
                let placeholder = extraction_placeholder(&file.name);
                Extracted {
                    document: Document::new(file.name, kind, byte_size, placeholder),
                    failed: true,
                }
            }
        }
    }))
    .await
}

/// Ingest a batch of uploaded files into the store: dedup, then extraction,
/// then one atomic commit. Dedup is owned here, not by the store.
///
/// An empty batch is a no-op. Already-present files are dropped silently:
/// presence is a coarse fingerprint, not a content hash, so a same-named and
/// same-sized file with different content is not detected as changed.
pub async fn sync_batch(
    store: &mut DocumentStore,
    extractor: &dyn TextExtractor,
    files: Vec<UploadedFile>,
) -> SyncReport {
    if files.is_empty() {
        return SyncReport::default();
    }

    let total = files.len();
    let new_files: Vec<UploadedFile> = files
        .into_iter()
        .filter(|f| {
            let present = store.contains(&f.name, f.byte_size());
            if present {
                debug!(name = %f.name, "file already present, skipping");
            }
            !present
        })
        .collect();
    let skipped = total - new_files.len();

    let extractions = extract_batch(extractor, new_files).await;

    let failed = extractions.iter().filter(|e| e.failed).count();
    let batch: Vec<Document> = extractions.into_iter().map(|e| e.document).collect();
    let added = batch.len();

    // Single atomic commit; partial batches are never visible.
    store.add(batch);

    info!(added, skipped, failed, "sync batch committed");
    SyncReport {
        added,
        skipped,
        failed,
    }
}
