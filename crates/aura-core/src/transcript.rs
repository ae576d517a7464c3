//! Transcript exporter.
//!
//! Flattens a session into a plain-text document:
//!
//! ```text
//! [1/2/2025, 3:04:05 PM] USER:
//! hello
//!
//! ---
//! [1/2/2025, 3:04:07 PM] ASSISTANT:
//! hi
//! ```

use crate::session::{ChatSession, Message};
use chrono::{Local, TimeZone};
use std::fmt::Display;

/// Separator placed between message blocks.
pub const BLOCK_SEPARATOR: &str = "\n---\n";

const FILE_NAME_PREFIX: &str = "Aura_AI_Transcript_";
const TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// A rendered transcript ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub file_name: String,
    pub body: String,
}

/// Exports `session` using the local time zone.
///
/// Returns `None` when the session has no messages; nothing should be written
/// in that case.
pub fn export(session: &ChatSession) -> Option<Transcript> {
    export_in(session, &Local)
}

/// Exports `session`, formatting timestamps in `tz`.
pub fn export_in<Tz>(session: &ChatSession, tz: &Tz) -> Option<Transcript>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if session.messages.is_empty() {
        return None;
    }

    let body = session
        .messages
        .iter()
        .map(|message| render_block(message, tz))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR);

    Some(Transcript {
        file_name: file_name_for(&session.title),
        body,
    })
}

/// File name derived from a session title: whitespace runs become `_`.
pub fn file_name_for(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    let mut in_whitespace = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                stem.push('_');
            }
            in_whitespace = true;
        } else {
            stem.push(c);
            in_whitespace = false;
        }
    }
    if stem.is_empty() {
        stem.push_str("Chat");
    }
    format!("{FILE_NAME_PREFIX}{stem}.txt")
}

fn render_block<Tz>(message: &Message, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "[{}] {}:\n{}\n",
        format_timestamp(message.timestamp, tz),
        message.role.as_str().to_uppercase(),
        message.content
    )
}

fn format_timestamp<Tz>(millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match tz.timestamp_millis_opt(millis).single() {
        Some(at) => at.format(TIMESTAMP_FORMAT).to_string(),
        None => millis.to_string(),
    }
}
