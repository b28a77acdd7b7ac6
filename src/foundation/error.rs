/// Convenience result type used across scrubframe.
pub type ScrubResult<T> = Result<T, ScrubError>;

/// Top-level error taxonomy used by the renderer APIs.
#[derive(thiserror::Error, Debug)]
pub enum ScrubError {
    /// Invalid caller-provided data (config, viewport, indices).
    #[error("validation error: {0}")]
    Validation(String),

    /// The sequence manifest could not be fetched, parsed, or is unusable.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// A frame resource could not be decoded into pixels.
    #[error("decode error: {0}")]
    Decode(String),

    /// Errors raised while preparing or drawing into a surface.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrubError {
    /// Build a [`ScrubError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScrubError::Manifest`] value.
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    /// Build a [`ScrubError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`ScrubError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ScrubError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
