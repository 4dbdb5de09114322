//! Platform-specific implementations
//!
//! This module provides the OS input adapter and the foreground app resolver.
//!
//! # Platform Support
//!
//! - **Windows**: low-level keyboard/mouse hooks, foreground WinEvent hook,
//!   process and version-resource lookup
//! - **Other platforms**: fallback stubs (input source returns a platform
//!   error, resolver yields the placeholder app)

pub mod fallback;
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) mod hook_thread;
pub mod names;

#[cfg(windows)]
pub mod win32;

use std::sync::Arc;

use deskpulse_core::tracking::ports::{AppResolver, InputSource};

#[cfg(windows)]
pub use win32::{Win32AppResolver, Win32InputSource};

pub use fallback::{PlaceholderResolver, UnsupportedInputSource};

/// Input source for the current platform
pub fn default_input_source() -> Arc<dyn InputSource> {
    #[cfg(windows)]
    {
        Arc::new(Win32InputSource::new())
    }
    #[cfg(not(windows))]
    {
        Arc::new(UnsupportedInputSource)
    }
}

/// App resolver for the current platform
pub fn default_resolver() -> Arc<dyn AppResolver> {
    #[cfg(windows)]
    {
        Arc::new(Win32AppResolver::new())
    }
    #[cfg(not(windows))]
    {
        Arc::new(PlaceholderResolver)
    }
}
