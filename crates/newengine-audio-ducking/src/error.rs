use crate::status::NativeStatus;

/// Errors surfaced by the ducking binding.
///
/// Validation errors never touch the platform. `NativeOperationFailed` always names
/// the operation that failed and carries the platform status for diagnostics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DuckingError {
    /// Unrecognized enum value supplied by the caller.
    #[error("invalid argument `{name}`: unrecognized value {value}")]
    InvalidArgument { name: &'static str, value: String },

    /// Numeric parameter outside its valid interval.
    #[error("`{name}` out of range ({value}). {message}")]
    OutOfRange {
        name: &'static str,
        value: String,
        message: &'static str,
    },

    /// Operation attempted on a released controller.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// The platform call itself failed.
    #[error("{context}: {status}")]
    NativeOperationFailed {
        context: &'static str,
        status: NativeStatus,
    },
}

impl DuckingError {
    #[inline]
    pub(crate) fn disposed() -> Self {
        Self::InvalidState("object disposed")
    }

    #[inline]
    pub(crate) fn native(context: &'static str, status: NativeStatus) -> Self {
        Self::NativeOperationFailed { context, status }
    }

    /// Native status attached to the error, if any.
    #[inline]
    pub fn native_status(&self) -> Option<NativeStatus> {
        match self {
            Self::NativeOperationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type DuckingResult<T> = Result<T, DuckingError>;
