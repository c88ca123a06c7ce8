use thiserror::Error;

/// Precondition failures that keep a presentation session from starting.
///
/// All of these are checked before any task is spawned; a running session
/// has no fallible operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The image collection is empty.
    #[error("no images to present")]
    EmptyCollection,

    /// Fixed time is set to `other` without a usable custom duration.
    #[error("fixed-time is 'other' but no custom-fixed-time was entered")]
    UnresolvedCustomDuration,

    /// Schedule mode was selected with a schedule that has no interval groups.
    #[error("schedule '{0}' has no interval groups")]
    EmptySchedule(String),

    /// The selected schedule title does not match any saved schedule.
    #[error("no saved schedule named '{0}'")]
    UnknownSchedule(String),
}

/// Failures while assembling the image collection.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The folder is missing or not a directory.
    #[error("invalid image folder: {0}")]
    BadDir(String),

    /// The folder or file list contained no supported images.
    #[error("no image files found in {0}")]
    NoImages(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
