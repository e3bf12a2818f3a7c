/// Convenience result type used across bratgen.
pub type BratResult<T> = Result<T, BratError>;

/// Top-level error taxonomy for the generation pipeline.
#[derive(thiserror::Error, Debug)]
pub enum BratError {
    /// Invalid caller-provided input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// The rendering engine failed to produce a still image.
    #[error("render error: {0}")]
    Render(String),

    /// Video mode was requested for text that contains no words.
    #[error("no frames: text contains no words")]
    NoFrames,

    /// The external encoder failed or produced no output file.
    #[error("encode error: {0}")]
    Encode(String),

    /// A shared generation failed; carries the underlying message.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Filesystem failure on a path where IO is fatal (manifest or artifact writes).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BratError {
    /// Build a [`BratError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BratError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`BratError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`BratError::Generation`] value.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Whether the error was caused by the caller rather than by generation.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
