//! Error types for brush construction and editing.

use brushwork_kernel::KernelError;
use thiserror::Error;

/// Errors from building or editing a [`Brush`](crate::Brush).
#[derive(Error, Debug)]
pub enum BrushError {
    /// A face cut the brush away entirely.
    #[error("brush is empty: a face removed all of its volume")]
    Nullified,

    /// The faces do not enclose a volume inside the world bounds.
    #[error("brush is not closed by its faces")]
    Unbounded,

    /// The edit would move part of the brush outside the world bounds.
    #[error("brush would leave the world bounds")]
    OutsideWorld,

    /// Kernel-level failure (stale handle, invalid face).
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    /// A configuration value is not finite and positive.
    #[error("invalid config value for {field}: {value}")]
    InvalidConfig {
        /// The offending key.
        field: &'static str,
        /// Its value.
        value: f64,
    },

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result alias for brush operations.
pub type Result<T> = std::result::Result<T, BrushError>;
