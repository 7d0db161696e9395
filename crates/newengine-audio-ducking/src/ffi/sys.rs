#![allow(non_camel_case_types)]

use std::ffi::{c_int, c_uint, c_void};

/// `sound_stream_ducking_h`
pub(crate) type sound_stream_ducking_h = *mut c_void;

/// `sound_stream_ducking_state_changed_cb`
pub(crate) type sound_stream_ducking_state_changed_cb =
    unsafe extern "C" fn(stream_ducking: sound_stream_ducking_h, is_ducked: bool, user_data: *mut c_void);

pub(crate) type CreateFn = unsafe extern "C" fn(
    target_stream: c_int,
    callback: Option<sound_stream_ducking_state_changed_cb>,
    user_data: *mut c_void,
    stream_ducking: *mut sound_stream_ducking_h,
) -> c_int;

pub(crate) type DestroyFn = unsafe extern "C" fn(stream_ducking: sound_stream_ducking_h) -> c_int;

pub(crate) type IsDuckedFn =
    unsafe extern "C" fn(stream_ducking: sound_stream_ducking_h, is_ducked: *mut bool) -> c_int;

pub(crate) type ActivateFn = unsafe extern "C" fn(
    stream_ducking: sound_stream_ducking_h,
    duration: c_uint,
    ratio: f64,
) -> c_int;

pub(crate) type DeactivateFn = unsafe extern "C" fn(stream_ducking: sound_stream_ducking_h) -> c_int;

pub(crate) const SYM_CREATE: &[u8] = b"sound_manager_create_stream_ducking\0";
pub(crate) const SYM_DESTROY: &[u8] = b"sound_manager_destroy_stream_ducking\0";
pub(crate) const SYM_IS_DUCKED: &[u8] = b"sound_manager_is_ducked\0";
pub(crate) const SYM_ACTIVATE: &[u8] = b"sound_manager_activate_ducking\0";
pub(crate) const SYM_DEACTIVATE: &[u8] = b"sound_manager_deactivate_ducking\0";
