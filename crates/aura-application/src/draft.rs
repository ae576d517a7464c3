//! Message composer state: the text being typed and the pending attachments.

use aura_core::attachment::Attachment;
use aura_infrastructure::attachment_reader;
use std::path::PathBuf;

/// Unsent input for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    text: String,
    attachments: Vec<Attachment>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Reads `paths` and appends the files that could be read.
    ///
    /// Returns the number of attachments added.
    pub async fn attach_files(&mut self, paths: &[PathBuf]) -> usize {
        let read = attachment_reader::read_attachments(paths).await;
        let added = read.len();
        self.attachments.extend(read);
        added
    }

    /// Removes the pending attachment at `index`, if any.
    pub fn remove_attachment(&mut self, index: usize) -> Option<Attachment> {
        (index < self.attachments.len()).then(|| self.attachments.remove(index))
    }

    /// A draft can be sent when it has non-blank text or any attachment.
    pub fn is_sendable(&self) -> bool {
        !self.text.trim().is_empty() || !self.attachments.is_empty()
    }

    /// Empties the draft, returning its text and attachments.
    pub fn take(&mut self) -> (String, Vec<Attachment>) {
        let draft = std::mem::take(self);
        (draft.text, draft.attachments)
    }
}
