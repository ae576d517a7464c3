//! Share codec.
//!
//! A conversation is shared as a link whose fragment is `chat=<encoded>`,
//! where `<encoded>` is base64 over the percent-escaped JSON of the message
//! list. Decoding accepts the fragment with or without the leading `#` and
//! tolerates the URL layer having percent-escaped the base64 text.

use crate::error::Result;
use crate::session::Message;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use thiserror::Error;

/// Fragment key carrying a shared conversation.
pub const SHARE_FRAGMENT_PREFIX: &str = "chat=";

/// Reasons a share fragment is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("fragment does not start with 'chat='")]
    MissingPrefix,

    #[error("invalid percent-escaping: {0}")]
    InvalidEscape(String),

    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("decoded bytes are not UTF-8")]
    InvalidUtf8,

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("payload is not an array")]
    NotAnArray,

    #[error("array does not hold messages: {0}")]
    InvalidMessages(String),
}

/// Encodes a message list into the value placed after `chat=`.
pub fn encode_messages(messages: &[Message]) -> Result<String> {
    let json = serde_json::to_string(messages)?;
    let escaped = urlencoding::encode(&json);
    Ok(BASE64_STANDARD.encode(escaped.as_bytes()))
}

/// Builds the `chat=<encoded>` fragment for a message list.
pub fn encode_fragment(messages: &[Message]) -> Result<String> {
    Ok(format!("{SHARE_FRAGMENT_PREFIX}{}", encode_messages(messages)?))
}

/// Builds a full share link from `base_url` (any existing fragment is replaced).
pub fn share_link(base_url: &str, messages: &[Message]) -> Result<String> {
    let (base, _) = split_fragment(base_url);
    Ok(format!("{base}#{}", encode_fragment(messages)?))
}

/// Splits a link into the part before `#` and the fragment after it.
pub fn split_fragment(link: &str) -> (&str, Option<&str>) {
    match link.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (link, None),
    }
}

/// Whether `fragment` (with or without `#`) carries a shared conversation.
pub fn is_share_fragment(fragment: &str) -> bool {
    fragment
        .strip_prefix('#')
        .unwrap_or(fragment)
        .starts_with(SHARE_FRAGMENT_PREFIX)
}

/// Decodes a `chat=<encoded>` fragment back into the message list.
pub fn decode_fragment(fragment: &str) -> std::result::Result<Vec<Message>, DecodeError> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let value = fragment
        .strip_prefix(SHARE_FRAGMENT_PREFIX)
        .ok_or(DecodeError::MissingPrefix)?;
    decode_messages(value)
}

/// Decodes the value after `chat=` back into the message list.
pub fn decode_messages(value: &str) -> std::result::Result<Vec<Message>, DecodeError> {
    // The URL layer may have escaped base64 characters such as '+' or '='
    let unescaped =
        urlencoding::decode(value).map_err(|e| DecodeError::InvalidEscape(e.to_string()))?;
    let bytes = BASE64_STANDARD
        .decode(unescaped.trim().as_bytes())
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;
    let escaped = String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
    let json =
        urlencoding::decode(&escaped).map_err(|e| DecodeError::InvalidEscape(e.to_string()))?;

    let parsed: serde_json::Value =
        serde_json::from_str(&json).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
    if !parsed.is_array() {
        return Err(DecodeError::NotAnArray);
    }

    serde_json::from_value(parsed).map_err(|e| DecodeError::InvalidMessages(e.to_string()))
}
