//! Context assembly: serialize the document store into one grounding blob.
//!
//! Deterministic concatenation in store order, one banner-delimited block per
//! document. No truncation, dedup, or size budgeting is applied — the whole
//! corpus always goes into the prompt (documented scalability limit).

use crate::models::Document;
use crate::prompts::NO_DOCUMENTS_SENTINEL;

/// Serialize `documents` into the grounding context blob.
///
/// An empty list yields the fixed "no documents" sentinel rather than an
/// empty string, so the prompt can state the absence explicitly.
pub fn assemble(documents: &[Document]) -> String {
    if documents.is_empty() {
        return NO_DOCUMENTS_SENTINEL.to_string();
    }
    documents
        .iter()
        .map(|d| {
            format!(
                "--- INIZIO DOCUMENTO: {} ---\n{}\n--- FINE DOCUMENTO ---\n",
                d.name, d.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
