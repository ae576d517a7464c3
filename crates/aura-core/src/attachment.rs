//! Attachment codec.
//!
//! Turns the raw bytes of a user-selected file into an [`Attachment`] record.
//! Images keep their bytes as base64; everything else is stored as decoded text.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

/// MIME type used when the media type of a file cannot be determined.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// A file bundled with a user message.
///
/// Serialized with the same keys the shared links and the session file use:
/// `name`, `type`, `data`, `isImage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Original file name
    pub name: String,
    /// Declared media type (e.g. `image/png`, `text/plain`)
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Base64 for images, decoded text otherwise
    #[serde(rename = "data")]
    pub payload: String,
    /// Whether `payload` holds base64 image bytes
    #[serde(rename = "isImage")]
    pub is_image: bool,
}

impl Attachment {
    /// Encodes file contents into an attachment.
    ///
    /// Non-UTF-8 bytes in text files are replaced with U+FFFD, the same way a
    /// text reader would surface them.
    pub fn encode(name: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        let mime_type = mime_type.into();
        let is_image = is_image_mime(&mime_type);
        let payload = if is_image {
            BASE64_STANDARD.encode(bytes)
        } else {
            String::from_utf8_lossy(bytes).into_owned()
        };

        Self {
            name: name.into(),
            mime_type,
            payload,
            is_image,
        }
    }

    /// Text form used when a non-image attachment is sent to the model.
    pub fn as_prompt_text(&self) -> String {
        format!("[Attached File: {}]\nContent: {}", self.name, self.payload)
    }
}

/// Returns true for `image/*` media types.
pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}
