use core_types::Session;

/// Summary statistics for the history panel. Recomputed on every
/// read; nothing here is cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub document_count: usize,
    pub question_count: usize,
    pub word_count: usize,
}

pub fn summarize(session: Option<&Session>) -> SessionSummary {
    let Some(session) = session else {
        return SessionSummary::default();
    };

    SessionSummary {
        document_count: session.uploaded_files.len(),
        question_count: session.qa_history.len(),
        word_count: session
            .qa_history
            .iter()
            .map(|entry| word_count(&entry.question) + word_count(&entry.answer))
            .sum(),
    }
}

/// A word is a maximal run of non-whitespace characters.
fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
