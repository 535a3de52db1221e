use thiserror::Error;

/// Error types for the animation baking pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BakeError {
    /// The input description is malformed; no partial bake is attempted
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller requested cancellation; all partial output was discarded
    #[error("Bake cancelled")]
    Cancelled,

    /// A rectangle could not be placed in the atlas
    #[error(
        "Packing error: no free space for a {width}x{height} region in an atlas of width {atlas_width}"
    )]
    PackingError {
        width: u32,
        height: u32,
        atlas_width: u32,
    },

    /// Internal error: an invariant of the pipeline was violated
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl BakeError {
    /// Whether this error only reports a cancelled bake
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type using BakeError
pub type Result<T> = std::result::Result<T, BakeError>;
