use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use backend_http::HttpDocumentBackend;
use config::ConfigStore;
use core_types::{ActiveView, NotificationKind, StagedFile};
use session_core::{FormattedAnswer, SessionController, format_answer, summarize};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let store = ConfigStore::from_default_location()?;
    let app_config = store.load_or_init()?;
    info!(path = %store.path().display(), "loaded configuration");
    let backend = HttpDocumentBackend::new(app_config.backend_base_url()).with_timeouts(
        app_config.backend.upload_timeout(),
        app_config.backend.question_timeout(),
    );
    let mut controller = SessionController::new(Arc::new(backend));

    println!("StudyMate — PDF Q&A client ({})", app_config.backend_base_url());
    println!("Type `help` for commands.");

    let stdin = io::stdin();
    loop {
        print_prompt(&controller)?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "help" => print_help(),
            "add" => add_files(&mut controller, rest),
            "rm" => remove_file(&mut controller, rest),
            "files" => print_staged(&controller),
            "upload" => controller.commit_staged().await,
            "ask" => controller.submit_question(rest).await,
            "refresh" => controller.refresh_session().await,
            "history" => print_history(&controller),
            "download" => save_export(&mut controller).await?,
            "reset" => controller.reset_session(),
            "view" => switch_view(&mut controller, rest),
            "quit" | "exit" => break,
            other => println!("Unknown command `{other}`. Type `help` for commands."),
        }

        print_notification(&controller);
        if command == "ask" {
            print_latest_answer(&controller);
        }
    }

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn print_help() {
    println!("  add <path>...   stage PDF files for upload");
    println!("  rm <index>      remove one staged file");
    println!("  files           list staged files");
    println!("  upload          submit the staged files");
    println!("  ask <question>  ask about the uploaded documents");
    println!("  refresh         re-sync the session from the backend");
    println!("  history         show the session summary and Q&A log");
    println!("  download        save the Q&A log to a text file");
    println!("  reset           start over with a fresh session");
    println!("  view <tab>      switch to upload, chat or history");
    println!("  quit            leave");
}

fn print_prompt(controller: &SessionController) -> Result<()> {
    let view = controller.state().active_view;
    print!("[{}] > ", view.title());
    io::stdout().flush().context("flush prompt")?;
    Ok(())
}

fn add_files(controller: &mut SessionController, paths: &str) {
    if paths.is_empty() {
        println!("Usage: add <path>...");
        return;
    }

    let mut candidates = Vec::new();
    for path in paths.split_whitespace() {
        match staged_file_from_path(Path::new(path)) {
            Ok(file) => candidates.push(file),
            Err(error) => println!("Skipping {path}: {error:#}"),
        }
    }

    let offered = candidates.len();
    let accepted = controller.stage_files(candidates);
    if accepted < offered {
        println!("Staged {accepted} of {offered} file(s); non-PDF files were skipped.");
    } else {
        println!("Staged {accepted} file(s).");
    }
}

fn staged_file_from_path(path: &Path) -> Result<StagedFile> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = if name.to_ascii_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    };
    Ok(StagedFile::new(name, mime_type, bytes))
}

fn remove_file(controller: &mut SessionController, argument: &str) {
    match argument.parse::<usize>() {
        Ok(index) => match controller.remove_staged(index) {
            Some(file) => println!("Removed {}.", file.name),
            None => println!("No staged file at index {index}."),
        },
        Err(_) => println!("Usage: rm <index>"),
    }
}

fn print_staged(controller: &SessionController) {
    if controller.staged_files().is_empty() {
        println!("Nothing staged. Use `add <path>` to stage PDF files.");
        return;
    }
    for (index, file) in controller.staged_files().iter().enumerate() {
        println!("  {index}: {} ({} bytes)", file.name, file.size_bytes());
    }
}

fn switch_view(controller: &mut SessionController, argument: &str) {
    let view = match argument {
        "upload" => ActiveView::Upload,
        "chat" => ActiveView::Chat,
        "history" => ActiveView::History,
        _ => {
            println!("Usage: view upload|chat|history");
            return;
        }
    };

    controller.select_view(view);
    if controller.state().active_view != view {
        println!("Chat needs an active session. Upload documents first.");
    }
}

fn print_notification(controller: &SessionController) {
    if let Some(notification) = controller.notification() {
        let marker = match notification.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
        };
        println!("[{marker}] {}", notification.message);
    }
}

fn print_latest_answer(controller: &SessionController) {
    let Some(entry) = controller
        .session()
        .and_then(|session| session.qa_history.last())
    else {
        return;
    };

    match format_answer(&entry.answer) {
        FormattedAnswer::Plain(text) => println!("{text}"),
        FormattedAnswer::Bullets(bullets) => {
            for bullet in bullets {
                println!("  * {bullet}");
            }
        }
    }

    if !entry.references.is_empty() {
        println!("  ({} supporting chunk(s))", entry.references.len());
    }
}

fn print_history(controller: &SessionController) {
    let Some(session) = controller.session() else {
        println!("No session yet. Upload documents to begin.");
        return;
    };

    let summary = summarize(Some(session));
    println!(
        "Session ...{} | {} document(s) | {} question(s) | {} word(s)",
        session.short_id(),
        summary.document_count,
        summary.question_count,
        summary.word_count
    );
    for name in &session.uploaded_files {
        println!("  doc: {name}");
    }
    for (index, entry) in session.qa_history.iter().enumerate() {
        println!("Q{}: {} [{}]", index + 1, entry.question, entry.timestamp);
        println!("A{}: {}", index + 1, entry.answer);
        for reference in &entry.references {
            let preview: String = reference.chunk.chars().take(120).collect();
            println!("    {:.1}% | {preview}", reference.score * 100.0);
        }
    }
}

async fn save_export(controller: &mut SessionController) -> Result<()> {
    if let Some(export) = controller.download_session_log().await {
        fs::write(&export.file_name, &export.bytes)
            .with_context(|| format!("failed to write {}", export.file_name))?;
        println!("Saved {}.", export.file_name);
    }
    Ok(())
}
