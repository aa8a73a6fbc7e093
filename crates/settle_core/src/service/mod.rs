//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and pipeline calls into cache-level APIs.
//! - Keep embedding layers decoupled from storage details.

pub mod settings_manager;
