use super::saved;
use crate::render;
use anyhow::Result;
use aura_application::{ChatService, Draft, SendOutcome};
use std::path::PathBuf;

/// Sends `text` with `files` to the current session and prints the reply.
///
/// Blank input with no readable files is a silent no-op.
pub async fn send(service: &ChatService, text: &str, files: &[PathBuf]) -> Result<()> {
    let mut draft = Draft::new();
    draft.set_text(text);
    let attached = draft.attach_files(files).await;
    if attached < files.len() {
        render::warn(format!("{} file(s) could not be read", files.len() - attached));
    }
    if !draft.is_sendable() {
        return Ok(());
    }

    let (text, attachments) = draft.take();
    if let Some(outcome) = saved(service.send_to_current(&text, attachments).await)? {
        print_outcome(&outcome);
    }
    Ok(())
}

pub fn print_outcome(outcome: &SendOutcome) {
    match outcome {
        SendOutcome::Rejected => {}
        SendOutcome::Replied { reply, .. } => render::print_message(reply),
        SendOutcome::Failed { reply, error, .. } => {
            render::error(error);
            render::print_message(reply);
        }
        SendOutcome::Discarded { .. } => {
            render::info("Reply discarded: its session was deleted.");
        }
    }
}
