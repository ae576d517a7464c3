//! Command handlers shared by the subcommands and the REPL.

pub mod send;
pub mod sessions;
pub mod share;
pub mod transcript;

use crate::render;
use aura_core::error::Result as AuraResult;

/// Reports a storage failure as a warning.
///
/// The store keeps the in-memory change when a write fails, so the command
/// carries on; `None` means the result was not saved.
pub(crate) fn saved<T>(result: AuraResult<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_storage() => {
            render::warn(format!("changes could not be saved: {e}"));
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
