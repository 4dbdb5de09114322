//! Lifecycle of a dedicated hook thread
//!
//! The thread reports its id before it installs anything, so a quit signal can
//! always reach it: after a registration timeout, after a failed signal, and on
//! stop. A thread left over from a timed-out registration already has its quit
//! signal queued; the next `start` joins it before spawning a new one.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use deskpulse_domain::{DeskPulseError, Result};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Progress reported by the hook thread, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Registration {
    /// The thread's message queue exists and will accept a quit signal.
    Started(u32),
    Installed,
    Failed(String),
}

/// Asks a hook thread to leave its message loop.
pub(crate) trait QuitSignal: Send + Sync {
    fn post_quit(&self, thread_id: u32) -> std::result::Result<(), String>;
}

struct HookThread {
    thread_id: u32,
    handle: JoinHandle<()>,
    installed: bool,
}

pub(crate) struct HookThreadSupervisor<Q> {
    name: &'static str,
    registration_timeout: Duration,
    quit: Q,
    thread: Mutex<Option<HookThread>>,
}

impl<Q: QuitSignal> HookThreadSupervisor<Q> {
    pub(crate) fn new(name: &'static str, registration_timeout: Duration, quit: Q) -> Self {
        Self { name, registration_timeout, quit, thread: Mutex::new(None) }
    }

    /// Spawn `body` and wait for it to report its hooks installed.
    ///
    /// Idempotent while running. On any error no hooks remain installed once
    /// the old thread drains its queue, and `start` may be called again.
    pub(crate) fn start<F>(&self, body: F) -> Result<()>
    where
        F: FnOnce(Sender<Registration>) + Send + 'static,
    {
        let mut slot = self.thread.lock();
        if slot.as_ref().map_or(false, |thread| thread.installed) {
            debug!(thread = self.name, "hook thread already running");
            return Ok(());
        }
        if let Some(stale) = slot.take() {
            debug!(thread_id = stale.thread_id, "joining hook thread from a timed-out registration");
            join_quietly(stale.handle);
        }

        let (ready_tx, ready_rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name(self.name.to_string())
            .spawn(move || body(ready_tx))
            .map_err(|e| DeskPulseError::Platform(format!("Failed to spawn hook thread: {}", e)))?;

        let thread_id = match ready_rx.recv() {
            Ok(Registration::Started(thread_id)) => thread_id,
            Ok(Registration::Failed(message)) => {
                join_quietly(handle);
                return Err(DeskPulseError::Platform(message));
            }
            Ok(Registration::Installed) | Err(_) => {
                join_quietly(handle);
                return Err(DeskPulseError::Platform(
                    "Hook thread exited before reporting its id".to_string(),
                ));
            }
        };

        match ready_rx.recv_timeout(self.registration_timeout) {
            Ok(Registration::Installed) => {
                *slot = Some(HookThread { thread_id, handle, installed: true });
                info!(thread_id, "input hooks registered");
                Ok(())
            }
            Ok(Registration::Failed(message)) => {
                join_quietly(handle);
                Err(DeskPulseError::Platform(message))
            }
            Ok(Registration::Started(_)) | Err(RecvTimeoutError::Disconnected) => {
                join_quietly(handle);
                Err(DeskPulseError::Platform("Hook thread exited during registration".to_string()))
            }
            Err(RecvTimeoutError::Timeout) => {
                if let Err(message) = self.quit.post_quit(thread_id) {
                    warn!(thread_id, error = %message, "failed to signal timed-out hook thread");
                }
                *slot = Some(HookThread { thread_id, handle, installed: false });
                Err(DeskPulseError::Platform("Hook registration timed out".to_string()))
            }
        }
    }

    /// Signal the thread and join it. Idempotent.
    ///
    /// If the signal cannot be delivered to a live thread, the thread is kept
    /// and `stop` may be retried.
    pub(crate) fn stop(&self) -> Result<()> {
        let mut slot = self.thread.lock();
        let Some(hook_thread) = slot.take() else {
            return Ok(());
        };

        if let Err(message) = self.quit.post_quit(hook_thread.thread_id) {
            if !hook_thread.handle.is_finished() {
                *slot = Some(hook_thread);
                return Err(DeskPulseError::Platform(format!("Failed to signal hook thread: {}", message)));
            }
        }

        hook_thread
            .handle
            .join()
            .map_err(|_| DeskPulseError::Platform("Hook thread panicked".to_string()))?;
        info!("input hooks unregistered");
        Ok(())
    }

    /// True while hooks are installed and the thread has not been stopped.
    pub(crate) fn is_running(&self) -> bool {
        self.thread.lock().as_ref().map_or(false, |thread| thread.installed)
    }

    /// True if any thread, installed or still draining, is held.
    pub(crate) fn has_thread(&self) -> bool {
        self.thread.lock().is_some()
    }
}

fn join_quietly(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        warn!("hook thread panicked");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    use super::*;

    /// Quit signal over a shared set of signalled thread ids
    #[derive(Clone, Default)]
    struct FakeQuit {
        signalled: Arc<Mutex<HashSet<u32>>>,
        refuse: Arc<AtomicBool>,
    }

    impl QuitSignal for FakeQuit {
        fn post_quit(&self, thread_id: u32) -> std::result::Result<(), String> {
            if self.refuse.load(Ordering::SeqCst) {
                return Err("queue full".to_string());
            }
            self.signalled.lock().insert(thread_id);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Threads {
        next_id: Arc<AtomicU32>,
        live: Arc<AtomicUsize>,
    }

    impl Threads {
        fn live(&self) -> usize {
            self.live.load(Ordering::SeqCst)
        }

        /// Body that installs after `install_delay`, then loops until signalled.
        fn body(
            &self,
            quit: &FakeQuit,
            install_delay: Duration,
        ) -> impl FnOnce(Sender<Registration>) + Send + 'static {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let live = Arc::clone(&self.live);
            let signalled = Arc::clone(&quit.signalled);
            move |ready| {
                live.fetch_add(1, Ordering::SeqCst);
                let _ = ready.send(Registration::Started(id));
                std::thread::sleep(install_delay);
                let _ = ready.send(Registration::Installed);
                while !signalled.lock().contains(&id) {
                    std::thread::sleep(Duration::from_millis(1));
                }
                live.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    fn supervisor(quit: &FakeQuit) -> HookThreadSupervisor<FakeQuit> {
        HookThreadSupervisor::new("test-hooks", Duration::from_millis(50), quit.clone())
    }

    fn wait_until(mut check: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if check() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_start_and_stop() {
        let quit = FakeQuit::default();
        let threads = Threads::default();
        let hooks = supervisor(&quit);

        hooks.start(threads.body(&quit, Duration::ZERO)).unwrap();
        assert!(hooks.is_running());
        hooks.start(threads.body(&quit, Duration::ZERO)).unwrap();
        assert_eq!(threads.live(), 1);

        hooks.stop().unwrap();
        assert!(!hooks.is_running());
        assert_eq!(threads.live(), 0);
        hooks.stop().unwrap();
    }

    #[test]
    fn test_timed_out_registration_is_signalled_and_reaped() {
        let quit = FakeQuit::default();
        let threads = Threads::default();
        let hooks = supervisor(&quit);

        let err = hooks.start(threads.body(&quit, Duration::from_millis(200))).unwrap_err();
        assert!(matches!(err, DeskPulseError::Platform(ref msg) if msg.contains("timed out")));
        assert!(!hooks.is_running());
        assert!(hooks.has_thread());

        // The late thread finishes installing, sees its queued quit and exits.
        assert!(wait_until(|| threads.live() == 0));

        hooks.start(threads.body(&quit, Duration::ZERO)).unwrap();
        assert!(hooks.is_running());
        assert_eq!(threads.live(), 1);
        hooks.stop().unwrap();
        assert_eq!(threads.live(), 0);
    }

    #[test]
    fn test_stop_after_timeout_joins_the_late_thread() {
        let quit = FakeQuit::default();
        let threads = Threads::default();
        let hooks = supervisor(&quit);

        assert!(hooks.start(threads.body(&quit, Duration::from_millis(150))).is_err());
        hooks.stop().unwrap();
        assert!(!hooks.has_thread());
        assert_eq!(threads.live(), 0);
    }

    #[test]
    fn test_failed_signal_keeps_thread_for_retry() {
        let quit = FakeQuit::default();
        let threads = Threads::default();
        let hooks = supervisor(&quit);
        hooks.start(threads.body(&quit, Duration::ZERO)).unwrap();

        quit.refuse.store(true, Ordering::SeqCst);
        assert!(matches!(hooks.stop(), Err(DeskPulseError::Platform(_))));
        assert!(hooks.is_running());
        assert_eq!(threads.live(), 1);

        quit.refuse.store(false, Ordering::SeqCst);
        hooks.stop().unwrap();
        assert!(!hooks.has_thread());
        assert_eq!(threads.live(), 0);
    }

    #[test]
    fn test_registration_failure_joins_thread() {
        let quit = FakeQuit::default();
        let hooks = supervisor(&quit);

        let err = hooks
            .start(|ready| {
                let _ = ready.send(Registration::Started(7));
                let _ = ready.send(Registration::Failed("keyboard hook refused".to_string()));
            })
            .unwrap_err();
        assert_eq!(err, DeskPulseError::Platform("keyboard hook refused".to_string()));
        assert!(!hooks.has_thread());
    }
}
