use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// No stars to bind glyph vertices to. Reported up front, since an empty
    /// result would otherwise look like an empty patch of sky.
    #[error("star catalog is empty")]
    EmptyCatalog,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
