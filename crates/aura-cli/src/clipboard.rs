//! Clipboard copy through the terminal (OSC 52).
//!
//! Works over SSH and inside most terminal multiplexers without a native
//! clipboard dependency. Terminals that do not support OSC 52 ignore it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use std::io::Write;

/// Builds the escape sequence that sets the system clipboard to `text`.
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", BASE64_STANDARD.encode(text.as_bytes()))
}

/// Writes the OSC 52 sequence for `text` to stdout.
pub fn copy(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(osc52_sequence(text).as_bytes())?;
    stdout.flush()
}
