#![forbid(unsafe_op_in_unsafe_fn)]
#![deny(rust_2018_idioms)]

//! Stream ducking binding.
//!
//! A [`DuckingController`] owns one platform session that lowers the volume of a
//! target [`StreamCategory`] on request, and republishes the platform's state
//! callback as [`DuckingStateChanged`] events.

pub mod category;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod null;
pub mod params;
pub mod platform;
pub mod status;

#[cfg(feature = "native")]
pub mod ffi;

pub use category::StreamCategory;
pub use config::{BackendConfig, BackendKind, ConfigError, DuckingConfig, SessionConfig};
pub use controller::DuckingController;
pub use error::{DuckingError, DuckingResult};
pub use events::{DuckingEvents, DuckingStateChanged, DuckingSubscription, SubscriptionId};
pub use null::{NativeCall, NativeOp, NotifyMode, NullDuckingPlatform};
pub use params::{DuckingParams, MAX_DUCKING_DURATION_MS};
pub use platform::{DuckingPlatform, SessionHandle, StateCallback};
pub use status::{NativeStatus, NativeStatusKind};
