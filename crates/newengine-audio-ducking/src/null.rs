use parking_lot::Mutex;
use std::collections::HashMap;

use crate::category::StreamCategory;
use crate::platform::{DuckingPlatform, SessionHandle, StateCallback};
use crate::status::NativeStatus;

const LOG_TARGET: &str = "audio.ducking.null";

/// Platform call recorded by [`NullDuckingPlatform`].
#[derive(Clone, Debug, PartialEq)]
pub enum NativeCall {
    Create { category: StreamCategory },
    IsDucked { session: SessionHandle },
    Activate { session: SessionHandle, duration_ms: u32, ratio: f64 },
    Deactivate { session: SessionHandle },
    Release { session: SessionHandle },
}

/// Call kinds that can be made to fail with [`NullDuckingPlatform::fail_next`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeOp {
    Create,
    IsDucked,
    Activate,
    Deactivate,
}

/// How activate/deactivate calls that change a session's state deliver its callback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NotifyMode {
    /// Only the `simulate_*`/`fire_callback` helpers invoke callbacks.
    #[default]
    Manual,
    /// On the calling thread, before `activate`/`deactivate` returns.
    Inline,
    /// From a spawned worker thread.
    Thread,
}

/// Software ducking platform. Implements the session protocol, produces no sound.
///
/// Every call is journaled. Callback delivery for state changes follows the
/// configured [`NotifyMode`].
pub struct NullDuckingPlatform {
    state: Mutex<NullState>,
    notify: NotifyMode,
}

struct NullState {
    next_session: usize,
    sessions: HashMap<SessionHandle, NullSession>,
    journal: Vec<NativeCall>,
    failures: HashMap<NativeOp, NativeStatus>,
}

struct NullSession {
    category: StreamCategory,
    ducked: bool,
    callback: StateCallback,
}

impl Default for NullDuckingPlatform {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl NullDuckingPlatform {
    #[inline]
    pub fn new() -> Self {
        Self::with_notify(NotifyMode::Manual)
    }

    /// `true` selects [`NotifyMode::Thread`], `false` [`NotifyMode::Manual`].
    #[inline]
    pub fn with_auto_notify(auto_notify: bool) -> Self {
        Self::with_notify(if auto_notify {
            NotifyMode::Thread
        } else {
            NotifyMode::Manual
        })
    }

    pub fn with_notify(notify: NotifyMode) -> Self {
        Self {
            state: Mutex::new(NullState {
                next_session: 1,
                sessions: HashMap::new(),
                journal: Vec::new(),
                failures: HashMap::new(),
            }),
            notify,
        }
    }

    /// Makes the next call of kind `op` fail with `status` and have no effect.
    pub fn fail_next(&self, op: NativeOp, status: NativeStatus) {
        self.state.lock().failures.insert(op, status);
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.state.lock().journal.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().journal.clear();
    }

    #[inline]
    pub fn live_sessions(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn session_ids(&self) -> Vec<SessionHandle> {
        let mut ids: Vec<SessionHandle> = self.state.lock().sessions.keys().copied().collect();
        ids.sort_by_key(|h| h.as_raw());
        ids
    }

    pub fn category_of(&self, session: SessionHandle) -> Option<StreamCategory> {
        self.state.lock().sessions.get(&session).map(|s| s.category)
    }

    /// Changes the session state without invoking its callback.
    pub fn set_ducked(&self, session: SessionHandle, ducked: bool) -> bool {
        match self.state.lock().sessions.get_mut(&session) {
            Some(s) => {
                s.ducked = ducked;
                true
            }
            None => false,
        }
    }

    /// Sets the session state and invokes its callback on the calling thread.
    pub fn simulate_state_change(&self, session: SessionHandle, ducked: bool) -> bool {
        if !self.set_ducked(session, ducked) {
            return false;
        }
        self.fire_callback(session, ducked)
    }

    /// Invokes the session callback with `reported`, leaving the state untouched.
    ///
    /// Returns `false` for unknown sessions.
    pub fn fire_callback(&self, session: SessionHandle, reported: bool) -> bool {
        let callback = match self.state.lock().sessions.get(&session) {
            Some(s) => s.callback.clone(),
            None => return false,
        };
        callback(session, reported);
        true
    }

    fn take_failure(state: &mut NullState, op: NativeOp) -> Result<(), NativeStatus> {
        match state.failures.remove(&op) {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    fn set_and_maybe_notify(&self, session: SessionHandle, ducked: bool) -> Result<(), NativeStatus> {
        let notify = {
            let mut st = self.state.lock();
            let Some(s) = st.sessions.get_mut(&session) else {
                return Err(NativeStatus::INVALID_PARAMETER);
            };
            let changed = s.ducked != ducked;
            s.ducked = ducked;
            if changed && self.notify != NotifyMode::Manual {
                Some(s.callback.clone())
            } else {
                None
            }
        };

        if let Some(callback) = notify {
            match self.notify {
                NotifyMode::Inline => callback(session, ducked),
                NotifyMode::Thread => {
                    std::thread::spawn(move || callback(session, ducked));
                }
                NotifyMode::Manual => {}
            }
        }

        Ok(())
    }
}

impl DuckingPlatform for NullDuckingPlatform {
    fn create(
        &self,
        category: StreamCategory,
        callback: StateCallback,
    ) -> Result<SessionHandle, NativeStatus> {
        let mut st = self.state.lock();
        st.journal.push(NativeCall::Create { category });
        Self::take_failure(&mut st, NativeOp::Create)?;

        let raw = st.next_session;
        st.next_session += 1;
        let session = SessionHandle::from_raw(raw).ok_or(NativeStatus::OUT_OF_MEMORY)?;

        st.sessions.insert(
            session,
            NullSession {
                category,
                ducked: false,
                callback,
            },
        );

        log::debug!(target: LOG_TARGET, "create {session:?} category={category}");
        Ok(session)
    }

    fn is_ducked(&self, session: SessionHandle) -> Result<bool, NativeStatus> {
        let mut st = self.state.lock();
        st.journal.push(NativeCall::IsDucked { session });
        Self::take_failure(&mut st, NativeOp::IsDucked)?;

        st.sessions
            .get(&session)
            .map(|s| s.ducked)
            .ok_or(NativeStatus::INVALID_PARAMETER)
    }

    fn activate(
        &self,
        session: SessionHandle,
        duration_ms: u32,
        ratio: f64,
    ) -> Result<(), NativeStatus> {
        {
            let mut st = self.state.lock();
            st.journal.push(NativeCall::Activate {
                session,
                duration_ms,
                ratio,
            });
            Self::take_failure(&mut st, NativeOp::Activate)?;
        }
        log::debug!(target: LOG_TARGET, "activate {session:?} duration={duration_ms}ms ratio={ratio}");
        self.set_and_maybe_notify(session, true)
    }

    fn deactivate(&self, session: SessionHandle) -> Result<(), NativeStatus> {
        {
            let mut st = self.state.lock();
            st.journal.push(NativeCall::Deactivate { session });
            Self::take_failure(&mut st, NativeOp::Deactivate)?;
        }
        log::debug!(target: LOG_TARGET, "deactivate {session:?}");
        self.set_and_maybe_notify(session, false)
    }

    fn release(&self, session: SessionHandle) {
        let removed = {
            let mut st = self.state.lock();
            st.journal.push(NativeCall::Release { session });
            st.sessions.remove(&session)
        };

        match removed {
            Some(_) => log::debug!(target: LOG_TARGET, "release {session:?}"),
            None => log::warn!(target: LOG_TARGET, "release of unknown session {session:?}"),
        }
    }
}
