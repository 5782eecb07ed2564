use thiserror::Error;

use crate::repos::StoreError;

/// The error taxonomy every tool operation and query speaks (spec §7).
///
/// These are kinds, not exhaustive variant sets: each carries a human
/// readable message for the MCP caller and is cheap to construct from
/// the lower-level [`StoreError`].
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("notification delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::NotFound(_) => "NotFound",
            Self::Conflict(_) => "Conflict",
            Self::PermissionDenied(_) => "PermissionDenied",
            Self::DeliveryFailed(_) => "DeliveryFailed",
            Self::Internal(_) => "Internal",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidArgument(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::PermissionDenied(m)
            | Self::DeliveryFailed(m)
            | Self::Internal(m) => m.clone(),
        }
    }
}

/// Storage constraint violations translate to `InvalidArgument` or
/// `Conflict` as appropriate (spec §7); anything else surfaces as
/// `Internal` because it represents an unexpected storage failure.
impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ForeignKeyViolation(msg) => CoreError::InvalidArgument(msg),
            StoreError::UniqueViolation(msg) => CoreError::Conflict(msg),
            StoreError::NotFound(msg) => CoreError::NotFound(msg),
            StoreError::InvalidData(msg) => CoreError::InvalidArgument(msg),
            StoreError::Database(err) => CoreError::Internal(format!("database error: {err}")),
        }
    }
}
