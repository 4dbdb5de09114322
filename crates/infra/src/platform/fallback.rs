//! Fallback stubs for platforms without an input adapter

use deskpulse_core::tracking::ports::{AppResolver, EventSink, InputSource};
use deskpulse_domain::{DeskPulseError, ResolvedApp, Result, WindowHandle};

const UNSUPPORTED: &str = "Input capture is only supported on Windows";

/// Input source for unsupported platforms.
///
/// `start` returns a platform error; `stop` is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedInputSource;

impl InputSource for UnsupportedInputSource {
    fn start(&self, _sink: EventSink) -> Result<()> {
        Err(DeskPulseError::Platform(UNSUPPORTED.to_string()))
    }

    fn stop(&self) -> Result<()> {
        Ok(())
    }

    fn is_running(&self) -> bool {
        false
    }
}

/// Resolver that always yields the placeholder app
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderResolver;

impl AppResolver for PlaceholderResolver {
    fn resolve(&self, _window: WindowHandle) -> ResolvedApp {
        ResolvedApp::unknown()
    }
}
