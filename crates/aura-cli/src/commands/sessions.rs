use super::saved;
use crate::render;
use anyhow::{Result, bail};
use aura_application::ChatService;

pub async fn list(service: &ChatService) -> Result<()> {
    let sessions = service.sessions().await;
    let current = service.current_session_id().await;
    render::print_sessions(&sessions, current.as_deref());
    Ok(())
}

pub async fn new(service: &ChatService) -> Result<()> {
    if let Some(session) = saved(service.create_session().await)? {
        render::info(format!("Started session {}", session.id));
    }
    Ok(())
}

pub async fn select(service: &ChatService, target: &str) -> Result<()> {
    let Some(id) = render::resolve_session_id(&service.sessions().await, target) else {
        bail!("No session matches '{}'", target);
    };
    saved(service.select_session(&id).await)?;
    if let Some(session) = service.current_session().await {
        render::info(format!("Switched to: {}", session.title));
    }
    Ok(())
}

pub async fn delete(service: &ChatService, target: &str) -> Result<()> {
    let Some(id) = render::resolve_session_id(&service.sessions().await, target) else {
        bail!("No session matches '{}'", target);
    };
    saved(service.delete_session(&id).await)?;
    render::info(format!("Deleted session {}", id));
    Ok(())
}

pub async fn clear(service: &ChatService) -> Result<()> {
    saved(service.clear_all().await)?;
    render::info("All sessions cleared.");
    Ok(())
}

pub async fn history(service: &ChatService) -> Result<()> {
    match service.current_session().await {
        Some(session) => render::print_history(&session),
        None => render::info("No active session."),
    }
    Ok(())
}
