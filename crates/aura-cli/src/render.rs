//! Terminal rendering shared by the REPL and one-shot subcommands.

use aura_core::session::{ChatSession, Message, MessageRole};
use chrono::{Local, TimeZone};
use colored::Colorize;
use std::fmt::Display;

/// `HH:MM` in the local time zone.
pub fn short_time(millis: i64) -> String {
    short_time_in(millis, &Local)
}

pub fn short_time_in<Tz>(millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tz.timestamp_millis_opt(millis)
        .single()
        .map(|at| at.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

pub fn print_message(message: &Message) {
    let time = short_time(message.timestamp).bright_black();
    let label = match message.role {
        MessageRole::User => "YOU".green().bold(),
        MessageRole::Assistant => "AURA".bright_magenta().bold(),
    };
    println!("{} {}", time, label);

    for line in message.content.lines() {
        match message.role {
            MessageRole::User => println!("  {}", line),
            MessageRole::Assistant => println!("  {}", line.bright_blue()),
        }
    }
    for attachment in message.attachments() {
        println!(
            "  {}",
            format!("+ {} ({})", attachment.name, attachment.mime_type).bright_black()
        );
    }
}

pub fn print_history(session: &ChatSession) {
    println!("{}", format!("== {} ==", session.title).bright_magenta().bold());
    for message in &session.messages {
        print_message(message);
    }
}

/// Numbered session list; the current session is marked with `*`.
pub fn print_sessions(sessions: &[ChatSession], current_id: Option<&str>) {
    if sessions.is_empty() {
        println!("{}", "No sessions.".bright_black());
        return;
    }
    for (index, session) in sessions.iter().enumerate() {
        let marker = if Some(session.id.as_str()) == current_id {
            "*".bright_green().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {:>2}. {} {}",
            marker,
            index + 1,
            session.title,
            format!("({} messages, {})", session.messages.len(), session.id).bright_black()
        );
    }
}

pub fn info(text: impl Display) {
    println!("{}", text.to_string().bright_black());
}

pub fn warn(text: impl Display) {
    eprintln!("{}", format!("Warning: {}", text).yellow());
}

pub fn error(text: impl Display) {
    eprintln!("{}", format!("Error: {}", text).red());
}

/// Resolves a 1-based list position or a literal session ID.
pub fn resolve_session_id(sessions: &[ChatSession], arg: &str) -> Option<String> {
    let arg = arg.trim();
    if let Ok(position) = arg.parse::<usize>() {
        if let Some(session) = position.checked_sub(1).and_then(|i| sessions.get(i)) {
            return Some(session.id.clone());
        }
    }
    sessions
        .iter()
        .find(|s| s.id == arg)
        .map(|s| s.id.clone())
}
