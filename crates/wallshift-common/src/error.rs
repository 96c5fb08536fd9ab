//! Errors raised by the data model and the history database.

/// Failure in the shared data model or the history store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An update targeted a wallpaper id with no history row.
    #[error("no history entry for wallpaper {0:?}")]
    UnknownWallpaper(String),

    /// The history database or its connection pool failed.
    #[error("history database: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source name that isn't one of the four providers.
    #[error("unknown image source {0:?}")]
    UnknownSource(String),

    /// A device descriptor with a zero dimension.
    #[error("device dimensions must be positive, got {width}x{height}")]
    InvalidDevice { width: u32, height: u32 },
}

impl Error {
    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
