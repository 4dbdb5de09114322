//! Windows input adapter and app resolver
//!
//! # Architecture
//! - A dedicated thread owns the low-level keyboard/mouse hooks and the
//!   foreground WinEvent hook, and pumps their message loop
//! - Hook callbacks convert the OS record into a
//!   [`CaptureEvent`](deskpulse_domain::CaptureEvent) and push it into the
//!   [`EventSink`](deskpulse_core::tracking::ports::EventSink); nothing else
//! - Stop posts `WM_QUIT` to the hook thread, which unhooks before exiting

mod hooks;
mod resolver;

pub use hooks::Win32InputSource;
pub use resolver::Win32AppResolver;
