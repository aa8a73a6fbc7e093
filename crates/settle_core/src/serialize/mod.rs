//! Serialization pipeline between cache values and stored blobs.
//!
//! # Responsibility
//! - Own the encode/decode pipeline and the surrogate envelope protocol.
//! - Keep storage escaping concerns out of repository SQL code.
//!
//! # Invariants
//! - `None` is the delete marker and passes through both directions.
//! - The escape transform is chosen by the repository's storage kind.

pub mod deserializer;
pub mod serializer;
pub mod wrapper;

/// Escape transform applied after structural encoding.
///
/// Backends with a binary-safe text column keep `Plain`; backends that
/// cannot store arbitrary text escape through base64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageEncoding {
    #[default]
    Plain,
    Base64,
}
