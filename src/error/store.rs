use thiserror::Error as ThisError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    NotFound,
    ReadFailure,
    WriteFailure,
}

/// The call's deadline passed before the store finished; nothing was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
#[error("store call deadline exceeded")]
pub struct DeadlineExceeded;

/// Failure surfaced by a quote store operation.
///
/// Listing operations never produce `NotFound`; an empty page is a successful result.
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("quote not found")]
    NotFound,

    #[error("store read failed: {0}")]
    ReadFailure(#[source] BoxError),

    #[error("store write failed: {0}")]
    WriteFailure(#[source] BoxError),
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::NotFound => StoreErrorKind::NotFound,
            StoreError::ReadFailure(_) => StoreErrorKind::ReadFailure,
            StoreError::WriteFailure(_) => StoreErrorKind::WriteFailure,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == StoreErrorKind::NotFound
    }

    pub(crate) fn read(cause: impl Into<BoxError>) -> Self {
        StoreError::ReadFailure(cause.into())
    }

    pub(crate) fn write(cause: impl Into<BoxError>) -> Self {
        StoreError::WriteFailure(cause.into())
    }
}
