use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::category::StreamCategory;
use crate::status::NativeStatus;

/// Opaque token for one platform-side ducking session.
///
/// Only the platform that issued it can interpret the value.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(NonZeroUsize);

impl SessionHandle {
    /// Returns `None` for a null token.
    #[inline]
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    #[inline]
    pub fn as_raw(self) -> usize {
        self.0.get()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionHandle({:#x})", self.0)
    }
}

/// State-change callback registered at session creation.
///
/// Invoked by the platform on a thread of its choosing with the session and the
/// ducked flag as the platform saw it.
pub type StateCallback = Arc<dyn Fn(SessionHandle, bool) + Send + Sync + 'static>;

/// Native stream-ducking facility.
///
/// Every call except `release` reports failure through a [`NativeStatus`]. Callers
/// own the returned session and must release it exactly once.
pub trait DuckingPlatform: Send + Sync {
    fn create(
        &self,
        category: StreamCategory,
        callback: StateCallback,
    ) -> Result<SessionHandle, NativeStatus>;

    fn is_ducked(&self, session: SessionHandle) -> Result<bool, NativeStatus>;

    fn activate(
        &self,
        session: SessionHandle,
        duration_ms: u32,
        ratio: f64,
    ) -> Result<(), NativeStatus>;

    fn deactivate(&self, session: SessionHandle) -> Result<(), NativeStatus>;

    /// Frees the session and unregisters its callback.
    fn release(&self, session: SessionHandle);
}
