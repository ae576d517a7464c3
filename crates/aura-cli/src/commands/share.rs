use super::saved;
use crate::{clipboard, render};
use anyhow::{Result, bail};
use aura_application::{ChatService, ImportError};

/// Prints a share link for the current session, optionally copying it.
pub async fn share(service: &ChatService, copy: bool) -> Result<()> {
    let Some(link) = saved(service.share_current().await)?.flatten() else {
        bail!("No active session to share");
    };
    println!("{}", link);
    if copy {
        clipboard::copy(&link)?;
        render::info("Link copied to clipboard.");
    }
    Ok(())
}

pub async fn import(service: &ChatService, link: &str) -> Result<()> {
    match service.import_link(link).await {
        Ok(imported) => {
            render::info(format!(
                "Imported {} messages as {}",
                imported.session.messages.len(),
                imported.session.id
            ));
            Ok(())
        }
        Err(ImportError::Store(e)) => saved::<()>(Err(e)).map(|_| ()),
        Err(e) => bail!("Import failed: {}", e),
    }
}
