use core_types::StagedFile;

/// Ordered list of locally selected files awaiting submission.
/// Staging is transient: it is drained when an upload is committed
/// and cleared entirely on session reset.
#[derive(Debug, Default)]
pub struct UploadStaging {
    files: Vec<StagedFile>,
}

impl UploadStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages the PDF-typed candidates, silently discarding the rest;
    /// returns how many were accepted.
    pub fn stage(&mut self, candidates: impl IntoIterator<Item = StagedFile>) -> usize {
        let before = self.files.len();
        self.files
            .extend(candidates.into_iter().filter(StagedFile::is_pdf));
        self.files.len() - before
    }

    pub fn remove(&mut self, index: usize) -> Option<StagedFile> {
        if index < self.files.len() {
            Some(self.files.remove(index))
        } else {
            None
        }
    }

    /// Drains the full staged list, leaving staging empty.
    pub fn take(&mut self) -> Vec<StagedFile> {
        std::mem::take(&mut self.files)
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> StagedFile {
        StagedFile::new(name, "application/pdf", vec![0x25, 0x50, 0x44, 0x46])
    }

    #[test]
    fn mixed_selection_keeps_only_pdfs() {
        let mut staging = UploadStaging::new();
        let accepted = staging.stage([
            pdf("a.pdf"),
            StagedFile::new("notes.txt", "text/plain", Vec::new()),
            pdf("b.pdf"),
        ]);
        assert_eq!(accepted, 2);
        let names: Vec<_> = staging.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.pdf", "b.pdf"]);
    }

    #[test]
    fn removes_one_staged_file_by_position() {
        let mut staging = UploadStaging::new();
        staging.stage([pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")]);

        let removed = staging.remove(1).expect("remove middle");
        assert_eq!(removed.name, "b.pdf");
        assert_eq!(staging.len(), 2);
        assert!(staging.remove(5).is_none());
    }

    #[test]
    fn take_drains_staging() {
        let mut staging = UploadStaging::new();
        staging.stage([pdf("a.pdf")]);
        let taken = staging.take();
        assert_eq!(taken.len(), 1);
        assert!(staging.is_empty());
    }
}
