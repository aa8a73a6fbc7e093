//! Runtime configuration surface consumed by the settings core.
//!
//! # Responsibility
//! - Carry the autoload and strict-mode toggles from the embedding app.
//!
//! # Invariants
//! - Defaults favor availability: lazy loads, silent degradation.

/// Configuration consumed by the settings manager at construction.
///
/// `autoload` switches every read to an eager full snapshot load. The
/// strict flags control, independently per direction, whether
/// serialize/deserialize failures propagate or degrade the affected
/// entry to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettingsConfig {
    /// Load the full snapshot before the first read.
    pub autoload: bool,
    /// Propagate serialize failures instead of dropping the entry.
    pub strict_serialize: bool,
    /// Propagate deserialize failures instead of yielding `None`.
    pub strict_deserialize: bool,
}

impl SettingsConfig {
    /// Both strict flags on; useful in development and tests.
    pub fn strict() -> Self {
        Self {
            autoload: false,
            strict_serialize: true,
            strict_deserialize: true,
        }
    }
}
