use crate::render;
use anyhow::{Context, Result};
use aura_application::ChatService;
use std::path::{Path, PathBuf};

/// Writes the current session's transcript into `dir`.
///
/// Returns the written path, or `None` when there was nothing to export.
pub async fn export(service: &ChatService, dir: &Path) -> Result<Option<PathBuf>> {
    let Some(transcript) = service.export_current().await else {
        render::info("Nothing to export.");
        return Ok(None);
    };

    let path = dir.join(&transcript.file_name);
    tokio::fs::write(&path, transcript.body.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("[Export] Wrote {}", path.display());
    render::info(format!("Transcript saved to {}", path.display()));
    Ok(Some(path))
}
