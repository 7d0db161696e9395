use std::fmt;

/// Raw status code returned by the platform sound manager.
///
/// Zero is success; everything else is kept verbatim so diagnostics can show the
/// exact value the platform produced.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeStatus(pub i32);

/// Coarse classification of a [`NativeStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeStatusKind {
    Success,
    OutOfMemory,
    PermissionDenied,
    InvalidParameter,
    InvalidOperation,
    NotSupported,
    Unknown,
}

impl NativeStatus {
    pub const NONE: Self = Self(0);
    pub const OUT_OF_MEMORY: Self = Self(-12);
    pub const PERMISSION_DENIED: Self = Self(-13);
    pub const INVALID_PARAMETER: Self = Self(-22);
    pub const INVALID_OPERATION: Self = Self(-38);
    pub const NOT_SUPPORTED: Self = Self(-0x4000_0000 + 2);

    #[inline]
    pub const fn code(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Converts a status returned by a native call into a `Result`.
    #[inline]
    pub fn check(self) -> Result<(), NativeStatus> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn kind(self) -> NativeStatusKind {
        match self {
            Self::NONE => NativeStatusKind::Success,
            Self::OUT_OF_MEMORY => NativeStatusKind::OutOfMemory,
            Self::PERMISSION_DENIED => NativeStatusKind::PermissionDenied,
            Self::INVALID_PARAMETER => NativeStatusKind::InvalidParameter,
            Self::INVALID_OPERATION => NativeStatusKind::InvalidOperation,
            Self::NOT_SUPPORTED => NativeStatusKind::NotSupported,
            _ => NativeStatusKind::Unknown,
        }
    }

    pub fn describe(self) -> &'static str {
        match self.kind() {
            NativeStatusKind::Success => "success",
            NativeStatusKind::OutOfMemory => "out of memory",
            NativeStatusKind::PermissionDenied => "permission denied",
            NativeStatusKind::InvalidParameter => "invalid parameter",
            NativeStatusKind::InvalidOperation => "invalid operation",
            NativeStatusKind::NotSupported => "not supported",
            NativeStatusKind::Unknown => "unknown native error",
        }
    }
}

impl From<i32> for NativeStatus {
    #[inline]
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Debug for NativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NativeStatus").field(&self.0).finish()
    }
}

impl fmt::Display for NativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.describe(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_classify() {
        assert_eq!(NativeStatus(0).kind(), NativeStatusKind::Success);
        assert_eq!(NativeStatus(-13).kind(), NativeStatusKind::PermissionDenied);
        assert_eq!(
            NativeStatus(-1073741822).kind(),
            NativeStatusKind::NotSupported
        );
        assert_eq!(NativeStatus(-9999).kind(), NativeStatusKind::Unknown);
    }

    #[test]
    fn check_maps_non_zero_to_err() {
        assert!(NativeStatus::NONE.check().is_ok());
        assert_eq!(
            NativeStatus::INVALID_OPERATION.check(),
            Err(NativeStatus::INVALID_OPERATION)
        );
    }

    #[test]
    fn display_keeps_raw_code() {
        let text = NativeStatus(-777).to_string();
        assert_eq!(text, "unknown native error (code -777)");
    }
}
