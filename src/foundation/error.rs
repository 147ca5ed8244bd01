/// Convenience result type used across Pensieve.
pub type PensieveResult<T> = Result<T, PensieveError>;

/// Top-level error taxonomy.
///
/// Most runtime trouble in a ceremony is absorbed locally (a module that cannot find its
/// target simply does not exist). The variants here cover the cases that do surface:
/// bad configuration caught at construction time and broken shader programs.
#[derive(thiserror::Error, Debug)]
pub enum PensieveError {
    /// Invalid user-provided values (phase windows, durations, wiring).
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration documents that cannot be merged or decoded.
    #[error("config error: {0}")]
    Config(String),

    /// Shader compile or link failure. Unrecoverable for the owning module.
    #[error("shader error: {0}")]
    Shader(String),

    /// Errors while rasterizing a surface for export.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PensieveError {
    /// Build a [`PensieveError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PensieveError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`PensieveError::Shader`] value.
    pub fn shader(msg: impl Into<String>) -> Self {
        Self::Shader(msg.into())
    }

    /// Build a [`PensieveError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PensieveError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for PensieveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
