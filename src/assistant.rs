//! The assistant application context: store, conversation, gateway.
//!
//! [`Assistant`] is the explicit session-lifetime struct that owns all
//! mutable state; there are no globals. Mutation is single-logical-thread
//! cooperative: locks are only ever held across straight-line code, never
//! across an await, and the only suspension points are text extraction and
//! the gateway call.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{error, info};

use crate::chat::{Conversation, SubmitOutcome};
use crate::config::Config;
use crate::context::assemble;
use crate::extract::{BuiltinExtractor, TextExtractor};
use crate::gateway::{ChatBackend, GatewayError, GeminiBackend, LlmGateway};
use crate::ingest::{self, SyncReport};
use crate::models::{Message, UploadedFile};
use crate::prompts::GENERATION_FAILED_MESSAGE;
use crate::store::DocumentStore;

pub struct Assistant {
    store: Mutex<DocumentStore>,
    conversation: Mutex<Conversation>,
    gateway: LlmGateway,
    extractor: Box<dyn TextExtractor>,
}

impl Assistant {
    /// Build an assistant backed by the Gemini API.
    ///
    /// Fails with [`GatewayError::MissingApiKey`] when no API key is
    /// configured: a fatal configuration error, surfaced before any request.
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let backend = Arc::new(GeminiBackend::new(&config.gateway)?);
        Ok(Self::with_backend(config, backend))
    }

    /// Build an assistant over an arbitrary backend (tests, other hosts).
    pub fn with_backend(config: &Config, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            store: Mutex::new(DocumentStore::new()),
            conversation: Mutex::new(Conversation::new()),
            gateway: LlmGateway::new(config.gateway.model.clone(), backend),
            extractor: Box::new(BuiltinExtractor),
        }
    }

    /// Replace the built-in extractor (tests, hosts with their own parsers).
    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    fn store(&self) -> MutexGuard<'_, DocumentStore> {
        self.store.lock().expect("document store lock poisoned")
    }

    fn conversation(&self) -> MutexGuard<'_, Conversation> {
        self.conversation.lock().expect("conversation lock poisoned")
    }

    /// Sync a batch of uploaded files into the knowledge base.
    pub async fn sync_files(&self, files: Vec<UploadedFile>) -> SyncReport {
        if files.is_empty() {
            return SyncReport::default();
        }
        // Pre-filter under the lock so already-present files cost no
        // extraction work; the lock is released across the extraction
        // suspension point.
        let total = files.len();
        let fresh: Vec<UploadedFile> = {
            let store = self.store();
            files
                .into_iter()
                .filter(|f| !store.contains(&f.name, f.byte_size()))
                .collect()
        };
        let mut skipped = total - fresh.len();

        let extracted = ingest::extract_batch(self.extractor.as_ref(), fresh).await;

        // Re-check the fingerprint at commit time: another sync may have
        // committed the same file while extraction ran without the lock.
        let mut store = self.store();
        let mut batch = Vec::new();
        let mut failed = 0;
        for item in extracted {
            if store.contains(&item.document.name, item.document.byte_size) {
                skipped += 1;
                continue;
            }
            if item.failed {
                failed += 1;
            }
            batch.push(item.document);
        }
        let added = batch.len();
        store.add(batch);

        SyncReport {
            added,
            skipped,
            failed,
        }
    }

    /// Current number of stored documents.
    pub fn document_count(&self) -> usize {
        self.store().len()
    }

    /// Total stored character count, for display/estimation.
    pub fn total_chars(&self) -> usize {
        self.store().total_chars()
    }

    /// Snapshot of the knowledge base listing.
    pub fn documents(&self) -> Vec<crate::models::Document> {
        self.store().documents().to_vec()
    }

    /// Remove all documents. Callers obtain user confirmation upstream.
    pub fn clear_documents(&self) {
        self.store().clear();
        info!("knowledge base cleared");
    }

    /// Snapshot of the conversation history.
    pub fn messages(&self) -> Vec<Message> {
        self.conversation().messages().to_vec()
    }

    /// Whether a request is currently in flight.
    pub fn is_pending(&self) -> bool {
        self.conversation().is_pending()
    }

    /// Submit one user message and await the assistant's reply.
    ///
    /// Rejected as a no-op when `text` trims to empty or a request is
    /// already in flight (single-flight guard; no queuing, no cancellation).
    /// On gateway failure the fixed apology is appended with `is_error`
    /// set and the raw error goes to the log only.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SubmitOutcome::Rejected;
        }

        let (generation, history, grounding_context) = {
            let mut convo = self.conversation();
            if convo.is_pending() {
                return SubmitOutcome::Rejected;
            }
            // History snapshot excludes the new user message; the gateway
            // appends the user turn itself.
            let history = convo.messages().to_vec();
            convo.push(Message::user(trimmed));
            convo.set_pending(true);
            let context = assemble(self.store().documents());
            (convo.generation(), history, context)
        };

        let result = self
            .gateway
            .generate_reply(trimmed, &grounding_context, &history)
            .await;

        let mut convo = self.conversation();
        if convo.generation() != generation {
            // The conversation was cleared while we were in flight; the
            // reply belongs to a history that no longer exists.
            info!("discarding reply for a cleared conversation");
            return SubmitOutcome::Dropped;
        }

        match result {
            Ok(reply) => {
                convo.push(Message::assistant(reply));
                convo.set_pending(false);
                SubmitOutcome::Replied
            }
            Err(err) => {
                error!(error = %err, "reply generation failed");
                convo.push(Message::assistant_error(GENERATION_FAILED_MESSAGE));
                convo.set_pending(false);
                SubmitOutcome::Failed
            }
        }
    }

    /// Destructive conversation reset; see [`Conversation::reset`].
    pub fn clear_conversation(&self) {
        self.conversation().reset();
    }
}
