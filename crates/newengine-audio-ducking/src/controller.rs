use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use crate::category::StreamCategory;
use crate::error::{DuckingError, DuckingResult};
use crate::events::{DuckingEvents, DuckingStateChanged, DuckingSubscription, SubscriptionId};
use crate::params::DuckingParams;
use crate::platform::{DuckingPlatform, SessionHandle, StateCallback};

const LOG_TARGET: &str = "audio.ducking";

/// One ducking session for a target stream category.
///
/// The controller is the sole owner of its platform session. The session is
/// released exactly once, either by [`DuckingController::release`] or on drop.
///
/// Platform callbacks may arrive on any thread, including the thread currently
/// inside `activate`/`deactivate`. They hold only a weak reference to the
/// controller state and re-read the live ducking state before notifying
/// subscribers.
pub struct DuckingController {
    category: StreamCategory,
    shared: Arc<Shared>,
}

struct Shared {
    platform: Arc<dyn DuckingPlatform>,
    state: Mutex<SessionState>,
    events: DuckingEvents,
}

/// The lock is never held across a platform call.
#[derive(Debug)]
struct SessionState {
    session: Session,
    /// Platform calls currently using the handle.
    in_flight: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Session {
    /// Between callback registration and the platform returning a handle.
    Pending,
    Live(SessionHandle),
    /// Release requested while calls were in flight; the last one frees the handle.
    Releasing(SessionHandle),
    Released,
}

/// Marks one platform call on a live handle. Dropping it may complete a deferred release.
struct InFlight<'a> {
    shared: &'a Shared,
    handle: SessionHandle,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let deferred = {
            let mut st = self.shared.state.lock();
            st.in_flight -= 1;
            match st.session {
                Session::Releasing(handle) if st.in_flight == 0 => {
                    st.session = Session::Released;
                    Some(handle)
                }
                _ => None,
            }
        };

        if let Some(handle) = deferred {
            self.shared.free(handle);
        }
    }
}

impl DuckingController {
    /// Creates a platform session bound to `category`.
    pub fn new(category: StreamCategory, platform: Arc<dyn DuckingPlatform>) -> DuckingResult<Self> {
        let shared = Arc::new(Shared {
            platform,
            state: Mutex::new(SessionState {
                session: Session::Pending,
                in_flight: 0,
            }),
            events: DuckingEvents::new(),
        });

        let callback = state_callback(Arc::downgrade(&shared));

        let handle = shared
            .platform
            .create(category, callback)
            .map_err(|status| DuckingError::native("unable to create stream ducking", status))?;

        shared.state.lock().session = Session::Live(handle);
        log::debug!(target: LOG_TARGET, "created {handle:?} for category={category}");

        Ok(Self { category, shared })
    }

    /// Same as [`DuckingController::new`] for a raw platform stream type.
    ///
    /// Unrecognized values fail before the platform is touched.
    pub fn with_raw_category(raw: i32, platform: Arc<dyn DuckingPlatform>) -> DuckingResult<Self> {
        let category = StreamCategory::from_raw(raw)?;
        Self::new(category, platform)
    }

    #[inline]
    pub fn target_category(&self) -> StreamCategory {
        self.category
    }

    /// True once release was requested, even if the platform handle is still
    /// being freed by an in-flight call.
    #[inline]
    pub fn is_released(&self) -> bool {
        matches!(
            self.shared.state.lock().session,
            Session::Releasing(_) | Session::Released
        )
    }

    /// Live ducking state, read from the platform on every call.
    pub fn is_ducked(&self) -> DuckingResult<bool> {
        self.with_session(|platform, handle| {
            platform
                .is_ducked(handle)
                .map_err(|status| DuckingError::native("failed to get running state", status))
        })
    }

    /// Asks the platform to duck the target category to `ratio` over `duration_ms`.
    ///
    /// Returns once the request is accepted; the state callback follows separately.
    pub fn activate(&self, duration_ms: u32, ratio: f64) -> DuckingResult<()> {
        let params = DuckingParams::new(duration_ms, ratio)?;
        self.activate_with(params)
    }

    pub fn activate_with(&self, params: DuckingParams) -> DuckingResult<()> {
        self.with_session(|platform, handle| {
            platform
                .activate(handle, params.duration_ms(), params.ratio())
                .map_err(|status| DuckingError::native("failed to activate ducking", status))
        })
    }

    pub fn deactivate(&self) -> DuckingResult<()> {
        self.with_session(|platform, handle| {
            platform
                .deactivate(handle)
                .map_err(|status| DuckingError::native("failed to deactivate ducking", status))
        })
    }

    /// Frees the platform session. Safe to call repeatedly, from any thread and
    /// from inside a state handler.
    ///
    /// If another platform call is using the handle, the handle is freed when
    /// that call returns.
    pub fn release(&self) {
        self.shared.release();
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DuckingStateChanged) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(handler)
    }

    #[inline]
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.events.unsubscribe(id)
    }

    #[inline]
    pub fn subscribe_channel(&self) -> DuckingSubscription {
        self.shared.events.subscribe_channel()
    }

    fn with_session<T>(
        &self,
        f: impl FnOnce(&dyn DuckingPlatform, SessionHandle) -> DuckingResult<T>,
    ) -> DuckingResult<T> {
        let call = self.shared.begin_call().ok_or_else(DuckingError::disposed)?;
        f(self.shared.platform.as_ref(), call.handle)
    }
}

impl Drop for DuckingController {
    fn drop(&mut self) {
        self.shared.release();
    }
}

impl std::fmt::Debug for DuckingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.shared.state.lock().session;
        f.debug_struct("DuckingController")
            .field("category", &self.category)
            .field("session", &session)
            .finish()
    }
}

impl Shared {
    /// `None` unless the session is live.
    fn begin_call(&self) -> Option<InFlight<'_>> {
        let mut st = self.state.lock();
        let Session::Live(handle) = st.session else {
            return None;
        };
        st.in_flight += 1;
        Some(InFlight {
            shared: self,
            handle,
        })
    }

    fn release(&self) {
        let handle = {
            let mut st = self.state.lock();
            match st.session {
                Session::Live(handle) if st.in_flight == 0 => {
                    st.session = Session::Released;
                    handle
                }
                Session::Live(handle) => {
                    st.session = Session::Releasing(handle);
                    log::debug!(
                        target: LOG_TARGET,
                        "release of {handle:?} deferred: {} call(s) in flight",
                        st.in_flight
                    );
                    return;
                }
                Session::Pending => {
                    st.session = Session::Released;
                    return;
                }
                Session::Releasing(_) | Session::Released => return,
            }
        };

        self.free(handle);
    }

    fn free(&self, handle: SessionHandle) {
        self.platform.release(handle);
        log::debug!(target: LOG_TARGET, "released {handle:?}");
    }

    fn on_state_changed(&self, reported: bool) {
        let Some(call) = self.begin_call() else {
            log::debug!(target: LOG_TARGET, "state callback ignored: session not live");
            return;
        };

        // The platform flag may already be stale; the live state wins.
        let live = self.platform.is_ducked(call.handle);
        drop(call);

        match live {
            Ok(is_ducked) => {
                if is_ducked != reported {
                    log::trace!(
                        target: LOG_TARGET,
                        "platform reported ducked={reported}, live state is {is_ducked}"
                    );
                }
                self.events.dispatch(DuckingStateChanged { is_ducked });
            }
            Err(status) => {
                log::warn!(
                    target: LOG_TARGET,
                    "state callback dropped: failed to get running state: {status}"
                );
            }
        }
    }
}

fn state_callback(shared: Weak<Shared>) -> StateCallback {
    Arc::new(move |_session, reported| {
        let Some(shared) = shared.upgrade() else { return };
        shared.on_state_changed(reported);
    })
}
