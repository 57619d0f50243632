//! Core data models used throughout the assistant.
//!
//! These types represent the documents and chat messages that flow through
//! the ingestion pipeline and the conversation orchestrator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Document kind detected from the file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    /// Detect the kind from a file name (case-insensitive suffix match).
    /// Anything that is not `.pdf` or `.docx` is treated as raw text.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.ends_with(".pdf") {
            DocumentKind::Pdf
        } else if lower.ends_with(".docx") {
            DocumentKind::Docx
        } else {
            DocumentKind::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
            DocumentKind::Text => "text",
        }
    }
}

/// A document in the knowledge base.
///
/// Created by the ingestion pipeline and never mutated afterwards. The dedup
/// identity used by sync is the `(name, byte_size)` pair, not `id`.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub kind: DocumentKind,
    pub byte_size: usize,
    pub ingested_at: DateTime<Utc>,
    pub content: String,
}

impl Document {
    pub fn new(name: String, kind: DocumentKind, byte_size: usize, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            kind,
            byte_size,
            ingested_at: Utc::now(),
            content,
        }
    }
}

/// A raw uploaded file before extraction: name plus raw bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}

/// Who produced a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A single chat turn. Append-only: messages are never edited or deleted
/// individually; the whole history is replaced only by clear-conversation.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_error: bool,
}

impl Message {
    fn build(role: Role, content: impl Into<String>, is_error: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            is_error,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::build(Role::User, content, false)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::build(Role::Assistant, content, false)
    }

    /// An assistant-side failure artifact. Error messages are shown to the
    /// user but filtered out of the history forwarded to the model.
    pub fn assistant_error(content: impl Into<String>) -> Self {
        Self::build(Role::Assistant, content, true)
    }
}
