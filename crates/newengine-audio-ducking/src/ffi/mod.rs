//! Runtime binding to the platform sound manager.
//!
//! The library is opened with `libloading` so hosts without it still link; only
//! [`SoundManagerLibrary::open`] fails.

mod library;
mod sys;

pub use library::{LibraryLoadError, SoundManagerLibrary, DEFAULT_LIBRARY};
