//! `kba` — terminal front end for the assistant core.
//!
//! Presentation layer only: loads documents from a directory, prints sync
//! reports, and runs a minimal chat loop on stdin. All behavior lives in
//! the library.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use walkdir::WalkDir;

use kb_assistant::{load_config, Assistant, Config, SubmitOutcome, SyncReport, UploadedFile};

#[derive(Parser, Debug)]
#[command(name = "kba", about = "Document-grounded chat assistant", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory of documents to load into the knowledge base at startup.
    #[arg(long, short = 'd')]
    docs: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    let assistant = Assistant::new(&config).context("gateway configuration error")?;

    if let Some(dir) = &cli.docs {
        let report = assistant.sync_files(collect_files(dir)?).await;
        print_report(&report);
    }

    println!("Assistente pronto. Scrivi una domanda, oppure :help per i comandi.");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            ":quit" | ":q" => break,
            ":help" => {
                println!(":load <dir>   carica documenti da una directory");
                println!(":docs         elenca i documenti caricati");
                println!(":clear-docs   svuota la knowledge base");
                println!(":clear        cancella la conversazione");
                println!(":quit         esci");
            }
            ":docs" => {
                for doc in assistant.documents() {
                    println!(
                        "  {}  ({}, {} byte)",
                        doc.name,
                        doc.kind.as_str(),
                        doc.byte_size
                    );
                }
                println!(
                    "{} documenti, {} caratteri totali",
                    assistant.document_count(),
                    assistant.total_chars()
                );
            }
            ":clear-docs" => {
                assistant.clear_documents();
                println!("Knowledge base svuotata.");
            }
            ":clear" => {
                assistant.clear_conversation();
                print_last_message(&assistant);
            }
            _ if line.starts_with(":load ") => {
                let dir = Path::new(line.trim_start_matches(":load ").trim());
                match collect_files(dir) {
                    Ok(files) => {
                        let report = assistant.sync_files(files).await;
                        print_report(&report);
                    }
                    Err(e) => eprintln!("errore: {e:#}"),
                }
            }
            "" => {}
            _ => {
                match assistant.submit(line).await {
                    SubmitOutcome::Rejected => {
                        println!("(richiesta già in corso, riprova tra poco)")
                    }
                    SubmitOutcome::Dropped => {}
                    SubmitOutcome::Replied | SubmitOutcome::Failed => {
                        print_last_message(&assistant)
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_last_message(assistant: &Assistant) {
    if let Some(msg) = assistant.messages().last() {
        println!("{}", msg.content);
    }
}

fn print_report(report: &SyncReport) {
    if report.added == 0 && report.skipped > 0 {
        println!("Tutti i file selezionati sono già aggiornati.");
    } else {
        println!(
            "Sincronizzazione completata: {} documenti aggiunti.",
            report.added
        );
        if report.skipped > 0 {
            println!("  già presenti: {}", report.skipped);
        }
        if report.failed > 0 {
            println!("  non leggibili (segnaposto): {}", report.failed);
        }
    }
}

/// Collect every regular file under `dir` as an upload batch.
fn collect_files(dir: &Path) -> Result<Vec<UploadedFile>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let bytes = std::fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        files.push(UploadedFile::new(name, bytes));
    }
    // Deterministic order for stable store listings.
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
