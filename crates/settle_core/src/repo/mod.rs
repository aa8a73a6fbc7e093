//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the settings persistence contract at the storage boundary.
//! - Isolate SQLite query details from cache orchestration.
//!
//! # Invariants
//! - Repositories deal in opaque serialized values only; decoding
//!   happens above this layer.
//! - Write paths validate keys before any mutation.

pub mod memory_repo;
pub mod settings_repo;
