//! Reads user-selected files into attachments.
//!
//! Each file is read exactly once; the bytes are then encoded according to the
//! MIME type guessed from the file name.

use aura_core::attachment::{Attachment, FALLBACK_MIME_TYPE};
use aura_core::error::{AuraError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Infers the MIME type from a filename extension using the `mime_guess` library.
pub fn infer_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.to_string())
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}

/// Reads a single file into an [`Attachment`].
pub async fn read_attachment(path: &Path) -> Result<Attachment> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AuraError::invalid_input(format!("not a file: {}", path.display())))?;

    let bytes = fs::read(path)
        .await
        .map_err(|e| AuraError::io(format!("Failed to read {}: {}", path.display(), e)))?;

    let attachment = Attachment::encode(name, infer_mime_type(path), &bytes);
    tracing::debug!(
        "[AttachmentReader] Read {} ({}, {} bytes)",
        attachment.name,
        attachment.mime_type,
        bytes.len()
    );
    Ok(attachment)
}

/// Reads a batch of files, dropping any that fail.
///
/// Order of the successful reads follows `paths`.
pub async fn read_attachments(paths: &[PathBuf]) -> Vec<Attachment> {
    let mut attachments = Vec::with_capacity(paths.len());
    for path in paths {
        match read_attachment(path).await {
            Ok(attachment) => attachments.push(attachment),
            Err(e) => tracing::warn!("[AttachmentReader] Skipping {}: {}", path.display(), e),
        }
    }
    attachments
}
