//! Integration tests for the conversation orchestrator and sync pipeline.
//!
//! The backend is mocked: `ScriptedBackend` replies from a queue and records
//! every request it receives; `GatedBackend` parks in-flight requests until
//! released, so tests can observe the `AwaitingReply` state from outside.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use kb_assistant::{
    Assistant, ChatBackend, ChatRequest, Config, GatewayError, Role, SubmitOutcome, UploadedFile,
};

struct ScriptedBackend {
    requests: Mutex<Vec<ChatRequest>>,
    replies: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedBackend {
    fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
        })
    }

    fn request(&self, idx: usize) -> ChatRequest {
        self.requests.lock().unwrap()[idx].clone()
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn generate(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GatewayError::Api {
                status: 500,
                message,
            }),
            None => Err(GatewayError::NoText),
        }
    }
}

/// Backend that signals when a request enters and parks until released.
struct GatedBackend {
    entered: Notify,
    release: Notify,
}

impl GatedBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            entered: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl ChatBackend for GatedBackend {
    async fn generate(&self, _request: &ChatRequest) -> Result<String, GatewayError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok("risposta tardiva".to_string())
    }
}

fn assistant_with(backend: Arc<dyn ChatBackend>) -> Assistant {
    Assistant::with_backend(&Config::default(), backend)
}

#[tokio::test]
async fn end_to_end_greeting_then_cited_answer() {
    let backend = ScriptedBackend::new(vec![
        Ok("Ciao! Come posso aiutarti con i documenti?"),
        Ok("Hai diritto a 20 giorni di ferie. [Fonte: policy.txt]"),
    ]);
    let assistant = assistant_with(backend.clone());

    // Store empty: greeting goes out with the no-documents sentinel.
    assert_eq!(assistant.submit("ciao").await, SubmitOutcome::Replied);
    let messages = assistant.messages();
    assert_eq!(messages.len(), 3); // welcome seed + user + assistant
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "ciao");
    assert_eq!(messages[2].role, Role::Assistant);
    assert!(!assistant.is_pending());
    assert!(backend
        .request(0)
        .system_instruction
        .contains("Nessun documento caricato al momento."));

    // Ingest policy.txt, then ask; the context must carry the document.
    let report = assistant
        .sync_files(vec![UploadedFile::new(
            "policy.txt",
            b"Ferie: 20 giorni".to_vec(),
        )])
        .await;
    assert_eq!(report.added, 1);

    assert_eq!(
        assistant.submit("Quanti giorni di ferie?").await,
        SubmitOutcome::Replied
    );
    let request = backend.request(1);
    assert!(request.system_instruction.contains("policy.txt"));
    assert!(request.system_instruction.contains("Ferie: 20 giorni"));
    assert_eq!(request.temperature, 0.0);

    let last = assistant.messages().into_iter().last().unwrap();
    assert!(last.content.contains("[Fonte: policy.txt]"));
}

#[tokio::test]
async fn blank_submit_is_rejected() {
    let backend = ScriptedBackend::new(vec![]);
    let assistant = assistant_with(backend.clone());
    assert_eq!(assistant.submit("   \n\t").await, SubmitOutcome::Rejected);
    assert_eq!(assistant.messages().len(), 1);
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn second_submit_while_awaiting_reply_is_a_noop() {
    let gate = GatedBackend::new();
    let assistant = Arc::new(assistant_with(gate.clone()));

    let in_flight = {
        let assistant = assistant.clone();
        tokio::spawn(async move { assistant.submit("prima").await })
    };
    gate.entered.notified().await;
    assert!(assistant.is_pending());

    let before = assistant.messages().len();
    assert_eq!(assistant.submit("seconda").await, SubmitOutcome::Rejected);
    assert_eq!(assistant.messages().len(), before);

    gate.release.notify_one();
    assert_eq!(in_flight.await.unwrap(), SubmitOutcome::Replied);
    assert!(!assistant.is_pending());
}

#[tokio::test]
async fn gateway_failure_appends_one_flagged_apology() {
    let backend = ScriptedBackend::new(vec![Err("connection refused")]);
    let assistant = assistant_with(backend.clone());

    let before = assistant.messages();
    assert_eq!(assistant.submit("domanda").await, SubmitOutcome::Failed);
    let after = assistant.messages();

    // Exactly two new messages: the user turn and the flagged apology.
    assert_eq!(after.len(), before.len() + 2);
    let apology = after.last().unwrap();
    assert!(apology.is_error);
    assert_eq!(apology.role, Role::Assistant);
    assert!(apology.content.contains("Mi dispiace, ho riscontrato un errore"));
    // The raw error never leaks into the visible message.
    assert!(!apology.content.contains("connection refused"));
    // Prior messages are untouched.
    for (old, new) in before.iter().zip(after.iter()) {
        assert_eq!(old.id, new.id);
        assert_eq!(old.content, new.content);
    }
    assert!(!assistant.is_pending());
}

#[tokio::test]
async fn error_messages_are_excluded_from_forwarded_history() {
    let backend = ScriptedBackend::new(vec![Err("boom"), Ok("tutto bene")]);
    let assistant = assistant_with(backend.clone());

    assert_eq!(assistant.submit("prima").await, SubmitOutcome::Failed);
    assert_eq!(assistant.submit("seconda").await, SubmitOutcome::Replied);

    let request = backend.request(1);
    let texts: Vec<&str> = request.turns.iter().map(|t| t.text.as_str()).collect();
    assert!(texts.contains(&"prima"));
    assert!(texts.contains(&"seconda"));
    assert!(!texts.iter().any(|t| t.contains("Mi dispiace")));
}

#[tokio::test]
async fn clear_conversation_leaves_one_clean_seed() {
    let backend = ScriptedBackend::new(vec![Ok("risposta")]);
    let assistant = assistant_with(backend);

    assistant.submit("ciao").await;
    assert!(assistant.messages().len() > 1);

    assistant.clear_conversation();
    let messages = assistant.messages();
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].is_error);
    assert_eq!(messages[0].content, "Chat cancellata. Come posso aiutarti ora?");
    assert!(!assistant.is_pending());
}

#[tokio::test]
async fn reply_arriving_after_clear_is_dropped() {
    let gate = GatedBackend::new();
    let assistant = Arc::new(assistant_with(gate.clone()));

    let in_flight = {
        let assistant = assistant.clone();
        tokio::spawn(async move { assistant.submit("domanda").await })
    };
    gate.entered.notified().await;

    assistant.clear_conversation();
    gate.release.notify_one();

    assert_eq!(in_flight.await.unwrap(), SubmitOutcome::Dropped);
    // The late reply never lands in the reset history.
    let messages = assistant.messages();
    assert_eq!(messages.len(), 1);
    assert!(!messages.iter().any(|m| m.content == "risposta tardiva"));
    assert!(!assistant.is_pending());
}

#[tokio::test]
async fn re_syncing_an_identical_file_adds_nothing() {
    let backend = ScriptedBackend::new(vec![]);
    let assistant = assistant_with(backend);

    let file = UploadedFile::new("manuale.txt", b"contenuto".to_vec());
    let first = assistant.sync_files(vec![file.clone()]).await;
    assert_eq!((first.added, first.skipped), (1, 0));

    let second = assistant.sync_files(vec![file]).await;
    assert_eq!((second.added, second.skipped), (0, 1));
    assert_eq!(assistant.document_count(), 1);
}

/// Extractor that parks its first call between the dedup pre-filter and the
/// store commit, so a second sync can overlap it.
struct BlockingExtractor {
    first: AtomicBool,
    entered: Arc<Barrier>,
    release: Arc<Barrier>,
}

impl kb_assistant::TextExtractor for BlockingExtractor {
    fn extract(
        &self,
        _kind: kb_assistant::DocumentKind,
        bytes: &[u8],
    ) -> Result<String, kb_assistant::ExtractError> {
        if self.first.swap(false, Ordering::SeqCst) {
            self.entered.wait();
            self.release.wait();
        }
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_syncs_of_the_same_file_commit_one_document() {
    let entered = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let backend = ScriptedBackend::new(vec![]);
    let assistant = Arc::new(
        Assistant::with_backend(&Config::default(), backend).with_extractor(Box::new(
            BlockingExtractor {
                first: AtomicBool::new(true),
                entered: entered.clone(),
                release: release.clone(),
            },
        )),
    );

    let file = UploadedFile::new("policy.txt", b"Ferie: 20 giorni".to_vec());

    // First sync passes the pre-filter (store empty) and parks in extraction.
    let first = {
        let assistant = assistant.clone();
        let file = file.clone();
        tokio::spawn(async move { assistant.sync_files(vec![file]).await })
    };
    entered.wait();

    // Second sync for the same file runs to completion meanwhile.
    let second = assistant.sync_files(vec![file]).await;
    assert_eq!((second.added, second.skipped), (1, 0));

    // Released, the first sync must detect the fingerprint at commit time.
    release.wait();
    let first = first.await.unwrap();
    assert_eq!((first.added, first.skipped), (0, 1));
    assert_eq!(assistant.document_count(), 1);
}

#[tokio::test]
async fn failed_extractions_stay_visible_as_placeholders() {
    let backend = ScriptedBackend::new(vec![]);
    let assistant = assistant_with(backend);

    // An invalid PDF fails extraction; the batch still lands whole.
    let report = assistant
        .sync_files(vec![
            UploadedFile::new("valido.txt", b"testo".to_vec()),
            UploadedFile::new("rotto.pdf", b"not a pdf".to_vec()),
        ])
        .await;
    assert_eq!(report.added, 2);
    assert_eq!(report.failed, 1);

    let docs = assistant.documents();
    let broken = docs.iter().find(|d| d.name == "rotto.pdf").unwrap();
    assert!(broken
        .content
        .contains("[ERRORE: Impossibile leggere il contenuto di rotto.pdf]"));
}
