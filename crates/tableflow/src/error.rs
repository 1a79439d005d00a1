//! Error types for tableflow

use thiserror::Error;

/// Result type alias for tableflow operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Error types for query composition and paged loading
#[derive(Debug, Error)]
pub enum FlowError {
    /// Invalid builder composition (bad identifier, subquery/base mismatch,
    /// paging over a non-read statement, ...).
    ///
    /// Always raised while the builder is being composed, never at render time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Execution-layer failure surfaced during a load or write
    #[error("Load error: {0}")]
    Load(String),

    /// A load kept being superseded by invalidations
    #[error("Load superseded by invalidation after {attempts} attempt(s)")]
    Stale { attempts: u32 },

    /// The paged source was closed
    #[error("Paged query source is closed")]
    Closed,
}

impl FlowError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a load error
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load(message.into())
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a load error
    pub fn is_load(&self) -> bool {
        matches!(self, Self::Load(_))
    }

    /// Check if this is a stale-load error
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for FlowError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.as_db_error() {
            Some(db_err) => Self::Load(format!("{}: {}", db_err.code().code(), db_err.message())),
            None => Self::Load(err.to_string()),
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for FlowError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Load(format!("pool: {err}"))
    }
}
