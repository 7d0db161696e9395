#![forbid(unsafe_op_in_unsafe_fn)]

use libloading::Library;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::{c_uint, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use super::sys::{
    sound_stream_ducking_h, ActivateFn, CreateFn, DeactivateFn, DestroyFn, IsDuckedFn,
    SYM_ACTIVATE, SYM_CREATE, SYM_DEACTIVATE, SYM_DESTROY, SYM_IS_DUCKED,
};
use crate::category::StreamCategory;
use crate::platform::{DuckingPlatform, SessionHandle, StateCallback};
use crate::status::NativeStatus;

const LOG_TARGET: &str = "audio.ducking.native";

/// Sound manager library name on platforms that ship it.
pub const DEFAULT_LIBRARY: &str = "libcapi-media-sound-manager.so.0";

#[derive(Debug, thiserror::Error)]
#[error("{}: {message}", .path.display())]
pub struct LibraryLoadError {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Clone, Copy)]
struct Api {
    create: CreateFn,
    destroy: DestroyFn,
    is_ducked: IsDuckedFn,
    activate: ActivateFn,
    deactivate: DeactivateFn,
}

/// Passed to the platform as `user_data`. Boxed so its address is stable while the
/// session lives.
struct CallbackSlot {
    callback: StateCallback,
}

/// [`DuckingPlatform`] backed by the platform sound manager, loaded at runtime.
pub struct SoundManagerLibrary {
    api: Api,
    slots: Mutex<HashMap<SessionHandle, Box<CallbackSlot>>>,
    path: PathBuf,
    // Declared last: fn pointers in `api` must not outlive the mapping.
    _lib: Library,
}

impl SoundManagerLibrary {
    pub fn open_default() -> Result<Self, LibraryLoadError> {
        Self::open(DEFAULT_LIBRARY)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibraryLoadError> {
        let path = path.as_ref();
        log::info!(target: LOG_TARGET, "sound manager: loading '{}'", path.display());

        let lib = unsafe { Library::new(path) }.map_err(|e| LibraryLoadError {
            path: path.to_path_buf(),
            message: format!("Library::new failed: {e}"),
        })?;

        let api = resolve(&lib).map_err(|message| LibraryLoadError {
            path: path.to_path_buf(),
            message,
        })?;

        Ok(Self {
            api,
            slots: Mutex::new(HashMap::new()),
            path: path.to_path_buf(),
            _lib: lib,
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    fn raw(session: SessionHandle) -> sound_stream_ducking_h {
        session.as_raw() as sound_stream_ducking_h
    }
}

fn resolve(lib: &Library) -> Result<Api, String> {
    // SAFETY: the fn pointer types in `sys` match the sound manager C declarations.
    unsafe {
        Ok(Api {
            create: symbol::<CreateFn>(lib, SYM_CREATE)?,
            destroy: symbol::<DestroyFn>(lib, SYM_DESTROY)?,
            is_ducked: symbol::<IsDuckedFn>(lib, SYM_IS_DUCKED)?,
            activate: symbol::<ActivateFn>(lib, SYM_ACTIVATE)?,
            deactivate: symbol::<DeactivateFn>(lib, SYM_DEACTIVATE)?,
        })
    }
}

/// # Safety
/// `T` must be the exact fn pointer type of the exported symbol.
unsafe fn symbol<T: Copy>(lib: &Library, name: &[u8]) -> Result<T, String> {
    let sym: libloading::Symbol<'_, T> = unsafe { lib.get(name) }.map_err(|e| {
        let printable = String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name));
        format!("symbol {printable} not found: {e}")
    })?;
    Ok(*sym)
}

unsafe extern "C" fn on_state_changed(
    stream_ducking: sound_stream_ducking_h,
    is_ducked: bool,
    user_data: *mut c_void,
) {
    if user_data.is_null() {
        return;
    }
    let Some(session) = SessionHandle::from_raw(stream_ducking as usize) else {
        return;
    };

    // SAFETY: `user_data` is the slot registered in `create`; it is freed only after
    // the platform confirmed destroy.
    let slot = unsafe { &*(user_data as *const CallbackSlot) };

    if catch_unwind(AssertUnwindSafe(|| (slot.callback)(session, is_ducked))).is_err() {
        log::error!(target: LOG_TARGET, "state callback for {session:?} panicked");
    }
}

/// Files `slot` under the handle native `create` produced.
fn adopt_slot(
    slots: &Mutex<HashMap<SessionHandle, Box<CallbackSlot>>>,
    raw: sound_stream_ducking_h,
    slot: Box<CallbackSlot>,
) -> Result<SessionHandle, NativeStatus> {
    let Some(session) = SessionHandle::from_raw(raw as usize) else {
        log::warn!(target: LOG_TARGET, "create reported success with a null handle");
        // The platform may still hold `user_data`.
        std::mem::forget(slot);
        return Err(NativeStatus::INVALID_OPERATION);
    };
    slots.lock().insert(session, slot);
    Ok(session)
}

impl DuckingPlatform for SoundManagerLibrary {
    fn create(
        &self,
        category: StreamCategory,
        callback: StateCallback,
    ) -> Result<SessionHandle, NativeStatus> {
        let slot = Box::new(CallbackSlot { callback });
        let user_data = &*slot as *const CallbackSlot as *mut c_void;
        let mut raw: sound_stream_ducking_h = std::ptr::null_mut();

        // SAFETY: `raw` is a valid out pointer; `slot` outlives the call and, on
        // success, the session.
        let code = unsafe {
            (self.api.create)(category.as_raw(), Some(on_state_changed), user_data, &mut raw)
        };
        NativeStatus(code).check()?;

        adopt_slot(&self.slots, raw, slot)
    }

    fn is_ducked(&self, session: SessionHandle) -> Result<bool, NativeStatus> {
        let mut ducked = false;
        // SAFETY: session came from `create` and has not been destroyed.
        let code = unsafe { (self.api.is_ducked)(Self::raw(session), &mut ducked) };
        NativeStatus(code).check()?;
        Ok(ducked)
    }

    fn activate(
        &self,
        session: SessionHandle,
        duration_ms: u32,
        ratio: f64,
    ) -> Result<(), NativeStatus> {
        // SAFETY: as above.
        let code =
            unsafe { (self.api.activate)(Self::raw(session), duration_ms as c_uint, ratio) };
        NativeStatus(code).check()
    }

    fn deactivate(&self, session: SessionHandle) -> Result<(), NativeStatus> {
        // SAFETY: as above.
        let code = unsafe { (self.api.deactivate)(Self::raw(session)) };
        NativeStatus(code).check()
    }

    fn release(&self, session: SessionHandle) {
        // SAFETY: the controller releases each session exactly once.
        let status = NativeStatus(unsafe { (self.api.destroy)(Self::raw(session)) });
        let slot = self.slots.lock().remove(&session);

        if let Err(status) = status.check() {
            log::warn!(target: LOG_TARGET, "destroy {session:?} failed: {status}");
            // The platform may still call into the slot.
            std::mem::forget(slot);
        }
    }
}

impl Drop for SoundManagerLibrary {
    fn drop(&mut self) {
        let leftover: Vec<SessionHandle> = self.slots.lock().keys().copied().collect();
        for session in leftover {
            log::warn!(target: LOG_TARGET, "destroying leaked session {session:?}");
            self.release(session);
        }
    }
}
