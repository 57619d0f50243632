//! # KB Assistant
//!
//! **A document-grounded conversational assistant core.**
//!
//! KB Assistant lets a user converse with an assistant whose answers are
//! grounded exclusively in a user-supplied document set. There is no vector
//! retrieval: the entire knowledge base is serialized into the prompt on
//! every turn ("stuff everything in context" RAG).
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌───────────────┐
//! │ Uploaded  │──▶│ Ingestion │──▶│ Document Store │
//! │  files    │   │ (extract) │   │  (in memory)  │
//! └───────────┘   └───────────┘   └──────┬────────┘
//!                                        │ assemble
//!                                        ▼
//!                  ┌──────────┐   ┌─────────────┐
//!                  │ Chat     │──▶│ LLM Gateway  │──▶ Gemini API
//!                  │ history  │   │ (grounding)  │
//!                  └──────────┘   └─────────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. Uploaded files are deduplicated by `(name, byte_size)` and dispatched
//!    to the text extractors ([`extract`]); failures become visible
//!    placeholder documents instead of aborting the batch ([`ingest`]).
//! 2. The **context assembler** ([`context`]) serializes the store into one
//!    banner-delimited grounding blob, in insertion order.
//! 3. The **conversation orchestrator** ([`assistant`]) enforces the
//!    single-flight guard, appends the user message optimistically, and
//!    awaits the **gateway** ([`gateway`]), which prepends the fixed
//!    grounding system instruction and pins temperature to zero.
//! 4. Gateway failures become a calm, fixed Italian apology flagged
//!    `is_error`; such messages are filtered out of later model turns.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types: `Document`, `Message`, `UploadedFile` |
//! | [`store`] | In-memory ordered document store |
//! | [`extract`] | PDF/DOCX/text extraction behind the `TextExtractor` seam |
//! | [`ingest`] | Sync pipeline: dedup → extract (fan-out) → atomic commit |
//! | [`context`] | Deterministic context blob assembly |
//! | [`prompts`] | Fixed Italian strings and the grounding instruction |
//! | [`gateway`] | `ChatBackend` trait and the Gemini REST backend |
//! | [`chat`] | Conversation state machine and submit outcomes |
//! | [`assistant`] | Session-lifetime application context |
//!
//! All state lives in memory for the session lifetime; nothing persists.

pub mod assistant;
pub mod chat;
pub mod config;
pub mod context;
pub mod extract;
pub mod gateway;
pub mod ingest;
pub mod models;
pub mod prompts;
pub mod store;

pub use assistant::Assistant;
pub use chat::{Conversation, SubmitOutcome};
pub use config::{load_config, Config, GatewayConfig};
pub use extract::{BuiltinExtractor, ExtractError, TextExtractor};
pub use gateway::{ChatBackend, ChatRequest, GatewayError, GeminiBackend, LlmGateway, Turn};
pub use ingest::SyncReport;
pub use models::{Document, DocumentKind, Message, Role, UploadedFile};
pub use store::DocumentStore;
