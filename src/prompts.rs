//! Fixed user-facing strings and the grounding system instruction.
//!
//! The deployment language is Italian; every string here is shown to the end
//! user (or to the model) verbatim. Raw technical errors never appear in any
//! of these — they go to the diagnostic log only.

/// Seed message of a fresh conversation.
pub const WELCOME_MESSAGE: &str = "Ciao! Sono il tuo assistente virtuale. Chiedimi pure informazioni su manuali e documenti aziendali.";

/// Seed message after an explicit clear-conversation.
pub const CHAT_CLEARED_MESSAGE: &str = "Chat cancellata. Come posso aiutarti ora?";

/// Calm apology shown in place of any gateway failure.
pub const GENERATION_FAILED_MESSAGE: &str = "Mi dispiace, ho riscontrato un errore nel generare la risposta. Assicurati che la chiave API sia configurata correttamente.";

/// Sentinel used as the context blob when no documents are loaded.
pub const NO_DOCUMENTS_SENTINEL: &str = "Nessun documento caricato al momento.";

/// Placeholder content for a document whose extraction failed. The failure
/// stays visible in the knowledge base listing instead of being dropped.
pub fn extraction_placeholder(file_name: &str) -> String {
    format!("[ERRORE: Impossibile leggere il contenuto di {}]", file_name)
}

/// Grounding system instruction, with the context blob embedded.
///
/// Encodes the four non-negotiable rules: inline `[Fonte: ...]` citations,
/// the fixed refusal sentence when the answer is not in the context, a
/// courteous reply to plain greetings, and Italian-only output.
pub fn system_instruction(document_context: &str) -> String {
    format!(
        "\
Sei un assistente virtuale aziendale rigoroso e preciso, progettato per supportare i colleghi.
Il tuo compito è rispondere alle domande basandoti ESCLUSIVAMENTE sui documenti forniti nel contesto qui sotto.

REGOLE TASSATIVE:
1. CITAZIONE DELLA FONTE: Ogni affermazione deve essere supportata da un documento. Al termine di ogni frase o paragrafo contenente un'informazione estratta, DEVI indicare la fonte tra parentesi quadre nel formato: [Fonte: nome_del_file.estensione]. Se l'informazione proviene da più file, citali tutti.
2. NIENTE INVENZIONI (NO HALLUCINATIONS): Se la risposta alla domanda non è presente esplicitamente nei documenti, rispondi: \"Mi dispiace, ma non ho trovato queste informazioni nei documenti caricati.\" NON usare conoscenze esterne per riempire i vuoti.
3. Se la domanda è un semplice saluto (es. \"ciao\"), rispondi cortesemente offrendo aiuto sui documenti.
4. Rispondi sempre in italiano.

--- DOCUMENTI DISPONIBILI (KNOWLEDGE BASE) ---
{}
--- FINE DOCUMENTI ---
",
        document_context
    )
}
