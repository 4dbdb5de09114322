//! Low-level input hooks
//!
//! Hook procedures receive no user context, so the active sink lives in a
//! process-wide slot. Only one [`Win32InputSource`] may be running at a time.

use std::sync::mpsc::Sender;
use std::time::Duration;

use chrono::Utc;
use deskpulse_core::tracking::ports::{EventSink, InputSource};
use deskpulse_domain::{
    CaptureEvent, KeyCode, MouseButton, RawInputEvent, RawInputKind, Result, ScreenPoint,
    WindowHandle,
};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::warn;
use windows::Win32::Foundation::{HMODULE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Accessibility::{SetWinEventHook, UnhookWinEvent, HWINEVENTHOOK};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetForegroundWindow, GetMessageW, PeekMessageW,
    PostThreadMessageW, SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx,
    EVENT_SYSTEM_FOREGROUND, HHOOK, KBDLLHOOKSTRUCT, MSG, MSLLHOOKSTRUCT, OBJID_WINDOW,
    PM_NOREMOVE, WH_KEYBOARD_LL, WH_MOUSE_LL, WINEVENT_OUTOFCONTEXT, WINEVENT_SKIPOWNPROCESS,
    WM_KEYDOWN, WM_KEYUP, WM_LBUTTONDOWN, WM_MBUTTONDOWN, WM_MOUSEMOVE, WM_MOUSEWHEEL, WM_QUIT,
    WM_RBUTTONDOWN, WM_SYSKEYDOWN, WM_SYSKEYUP, WM_USER,
};

use crate::platform::hook_thread::{HookThreadSupervisor, QuitSignal, Registration};

const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(2);
const HOOK_THREAD_NAME: &str = "deskpulse-input-hooks";

static SINK: Lazy<RwLock<Option<EventSink>>> = Lazy::new(|| RwLock::new(None));

struct InstalledHooks {
    keyboard: HHOOK,
    mouse: HHOOK,
    foreground: HWINEVENTHOOK,
}

/// Posts `WM_QUIT` to the hook thread's queue
struct PostQuit;

impl QuitSignal for PostQuit {
    fn post_quit(&self, thread_id: u32) -> std::result::Result<(), String> {
        // SAFETY: the id comes from GetCurrentThreadId on the hook thread,
        // whose queue exists before the id is reported; no pointers are passed.
        unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) }
            .map_err(|e| e.to_string())
    }
}

/// Windows input source backed by `SetWindowsHookExW` and `SetWinEventHook`
pub struct Win32InputSource {
    hooks: HookThreadSupervisor<PostQuit>,
}

impl Default for Win32InputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Win32InputSource {
    pub fn new() -> Self {
        Self { hooks: HookThreadSupervisor::new(HOOK_THREAD_NAME, REGISTRATION_TIMEOUT, PostQuit) }
    }
}

impl InputSource for Win32InputSource {
    fn start(&self, sink: EventSink) -> Result<()> {
        if self.hooks.is_running() {
            return Ok(());
        }
        self.hooks.start(run_hook_thread)?;
        *SINK.write() = Some(sink);
        push_current_foreground();
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        SINK.write().take();
        self.hooks.stop()
    }

    fn is_running(&self) -> bool {
        self.hooks.is_running()
    }
}

impl Drop for Win32InputSource {
    fn drop(&mut self) {
        if self.hooks.has_thread() {
            warn!("Win32InputSource dropped with a hook thread alive; unhooking");
            if let Err(e) = self.stop() {
                warn!(error = %e, "failed to unhook on drop");
            }
        }
    }
}

fn run_hook_thread(ready: Sender<Registration>) {
    // SAFETY: hook registration and the message loop run on this thread only;
    // the handles are released on the same thread before it exits.
    unsafe {
        let mut msg = MSG::default();
        // Creates this thread's message queue so WM_QUIT can be posted from here on.
        let _ = PeekMessageW(&mut msg, HWND(0), WM_USER, WM_USER, PM_NOREMOVE);
        let _ = ready.send(Registration::Started(GetCurrentThreadId()));

        let hooks = match install_hooks() {
            Ok(hooks) => hooks,
            Err(message) => {
                let _ = ready.send(Registration::Failed(message));
                return;
            }
        };
        let _ = ready.send(Registration::Installed);

        while GetMessageW(&mut msg, HWND(0), 0, 0).into() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        let _ = UnhookWindowsHookEx(hooks.keyboard);
        let _ = UnhookWindowsHookEx(hooks.mouse);
        let _ = UnhookWinEvent(hooks.foreground);
    }
}

unsafe fn install_hooks() -> std::result::Result<InstalledHooks, String> {
    let module = GetModuleHandleW(None).unwrap_or(HMODULE::default());

    let keyboard = SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), module, 0)
        .map_err(|e| format!("Failed to install keyboard hook: {}", e))?;

    let mouse = match SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), module, 0) {
        Ok(hook) => hook,
        Err(e) => {
            let _ = UnhookWindowsHookEx(keyboard);
            return Err(format!("Failed to install mouse hook: {}", e));
        }
    };

    let foreground = SetWinEventHook(
        EVENT_SYSTEM_FOREGROUND,
        EVENT_SYSTEM_FOREGROUND,
        HMODULE::default(),
        Some(foreground_event_proc),
        0,
        0,
        WINEVENT_OUTOFCONTEXT | WINEVENT_SKIPOWNPROCESS,
    );
    if foreground.0 == 0 {
        let _ = UnhookWindowsHookEx(keyboard);
        let _ = UnhookWindowsHookEx(mouse);
        return Err("Failed to install foreground event hook".to_string());
    }

    Ok(InstalledHooks { keyboard, mouse, foreground })
}

/// Seed the pipeline with the window that is already in front.
fn push_current_foreground() {
    // SAFETY: GetForegroundWindow takes no arguments and may return null.
    let hwnd = unsafe { GetForegroundWindow() };
    if hwnd.0 != 0 {
        push(CaptureEvent::ForegroundChanged { window: WindowHandle(hwnd.0), timestamp: Utc::now() });
    }
}

#[inline]
fn push(event: CaptureEvent) {
    if let Some(sink) = SINK.read().as_ref() {
        sink.push(event);
    }
}

#[inline]
fn push_input(kind: RawInputKind) {
    push(CaptureEvent::Input(RawInputEvent::new(kind, Utc::now())));
}

unsafe extern "system" fn keyboard_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == 0 {
        let data = *(lparam.0 as *const KBDLLHOOKSTRUCT);
        let key = KeyCode(data.vkCode);
        match wparam.0 as u32 {
            WM_KEYDOWN | WM_SYSKEYDOWN => push_input(RawInputKind::KeyDown { key }),
            WM_KEYUP | WM_SYSKEYUP => push_input(RawInputKind::KeyUp { key }),
            _ => {}
        }
    }
    CallNextHookEx(HHOOK(0), code, wparam, lparam)
}

unsafe extern "system" fn mouse_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == 0 {
        let data = *(lparam.0 as *const MSLLHOOKSTRUCT);
        let position = ScreenPoint::new(data.pt.x, data.pt.y);
        let click = |button| RawInputKind::MouseClick { button, position };
        match wparam.0 as u32 {
            WM_MOUSEMOVE => push_input(RawInputKind::MouseMove { position }),
            WM_LBUTTONDOWN => push_input(click(MouseButton::Left)),
            WM_RBUTTONDOWN => push_input(click(MouseButton::Right)),
            WM_MBUTTONDOWN => push_input(click(MouseButton::Middle)),
            WM_MOUSEWHEEL => {
                let delta = ((data.mouseData >> 16) & 0xffff) as i16 as i32;
                push_input(RawInputKind::MouseScroll { delta });
            }
            _ => {}
        }
    }
    CallNextHookEx(HHOOK(0), code, wparam, lparam)
}

unsafe extern "system" fn foreground_event_proc(
    _hook: HWINEVENTHOOK,
    event: u32,
    hwnd: HWND,
    id_object: i32,
    _id_child: i32,
    _event_thread: u32,
    _event_time: u32,
) {
    if event != EVENT_SYSTEM_FOREGROUND || id_object != OBJID_WINDOW.0 || hwnd.0 == 0 {
        return;
    }
    push(CaptureEvent::ForegroundChanged { window: WindowHandle(hwnd.0), timestamp: Utc::now() });
}
