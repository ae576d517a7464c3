//! Filesystem-backed infrastructure for aura.
//!
//! Path resolution, atomic file primitives, the JSON session repository,
//! configuration loading and attachment file reading.

pub mod attachment_reader;
pub mod config_service;
pub mod json_state_repository;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::json_state_repository::JsonStateRepository;
pub use crate::paths::{AuraPaths, PathError};
