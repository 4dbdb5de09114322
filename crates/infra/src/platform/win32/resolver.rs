//! Foreground window resolution
//!
//! Reads the window title, class, rectangle and maximized state, then the
//! owning process image path and its version resource. Version resources are
//! cached per executable path.

use std::ffi::c_void;
use std::path::Path;
use std::time::Duration;

use deskpulse_core::tracking::ports::AppResolver;
use deskpulse_domain::{ResolvedApp, WindowBounds, WindowHandle};
use moka::sync::Cache;
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{CloseHandle, HWND, RECT};
use windows::Win32::Storage::FileSystem::{
    GetFileVersionInfoSizeW, GetFileVersionInfoW, VerQueryValueW,
};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_FORMAT,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetClassNameW, GetWindowRect, GetWindowTextW, GetWindowThreadProcessId, IsZoomed,
};

use crate::platform::names::{display_name, process_name_from_path};

const VERSION_CACHE_CAPACITY: u64 = 512;
const VERSION_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
/// en-US, Unicode: used when the resource carries no translation table.
const DEFAULT_TRANSLATION: (u16, u16) = (0x0409, 0x04B0);

#[derive(Debug, Clone, Default)]
struct VersionInfo {
    version: Option<String>,
    publisher: Option<String>,
    product: Option<String>,
    description: Option<String>,
}

/// Windows app resolver
pub struct Win32AppResolver {
    versions: Cache<String, VersionInfo>,
}

impl Default for Win32AppResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Win32AppResolver {
    pub fn new() -> Self {
        Self {
            versions: Cache::builder()
                .max_capacity(VERSION_CACHE_CAPACITY)
                .time_to_live(VERSION_CACHE_TTL)
                .build(),
        }
    }

    /// Version resource of the image at `path`, cached only for files that
    /// exist so a vanished or inaccessible image is retried on the next switch.
    fn version_info(&self, path: &str) -> VersionInfo {
        if !Path::new(path).exists() {
            return VersionInfo::default();
        }
        self.versions.get_with(path.to_string(), || read_version_info(path))
    }
}

impl AppResolver for Win32AppResolver {
    fn resolve(&self, window: WindowHandle) -> ResolvedApp {
        let hwnd = HWND(window.0);
        if hwnd.0 == 0 {
            return ResolvedApp::unknown();
        }

        let mut app = ResolvedApp::unknown();
        app.window_title = window_text(hwnd);
        app.window_class = window_class(hwnd);
        if let Some(bounds) = window_bounds(hwnd) {
            app.window_bounds = bounds;
        }
        // SAFETY: IsZoomed only reads window state; a stale handle yields false.
        app.is_maximized = unsafe { IsZoomed(hwnd) }.as_bool();

        let Some(path) = process_image_path(hwnd) else {
            return app;
        };
        let process_name = process_name_from_path(&path);
        if process_name.is_empty() {
            return app;
        }

        let info = self.version_info(&path);
        app.app_name = display_name(info.product.as_deref(), info.description.as_deref(), &process_name);
        app.process_name = process_name;
        app.version = info.version;
        app.publisher = info.publisher;
        app.executable_path = path;
        app
    }
}

fn window_text(hwnd: HWND) -> String {
    let mut buffer = vec![0u16; 512];
    // SAFETY: the buffer outlives the call and its length bounds the write.
    let len = unsafe { GetWindowTextW(hwnd, &mut buffer) };
    if len <= 0 {
        return String::new();
    }
    String::from_utf16_lossy(&buffer[..len as usize])
}

fn window_class(hwnd: HWND) -> String {
    let mut buffer = vec![0u16; 256];
    // SAFETY: as above.
    let len = unsafe { GetClassNameW(hwnd, &mut buffer) };
    if len <= 0 {
        return String::new();
    }
    String::from_utf16_lossy(&buffer[..len as usize])
}

fn window_bounds(hwnd: HWND) -> Option<WindowBounds> {
    let mut rect = RECT::default();
    // SAFETY: rect is a valid out-pointer for the duration of the call.
    unsafe { GetWindowRect(hwnd, &mut rect) }.ok()?;
    Some(WindowBounds {
        left: rect.left,
        top: rect.top,
        width: rect.right - rect.left,
        height: rect.bottom - rect.top,
    })
}

fn process_image_path(hwnd: HWND) -> Option<String> {
    // SAFETY: the process handle is closed on every path after it is opened;
    // the buffer outlives QueryFullProcessImageNameW and `size` bounds it.
    unsafe {
        let mut pid: u32 = 0;
        GetWindowThreadProcessId(hwnd, Some(&mut pid));
        if pid == 0 {
            return None;
        }
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;
        if handle.is_invalid() {
            return None;
        }
        let mut buffer = vec![0u16; 1024];
        let mut size = buffer.len() as u32;
        let queried = QueryFullProcessImageNameW(
            handle,
            PROCESS_NAME_FORMAT(0),
            PWSTR(buffer.as_mut_ptr()),
            &mut size,
        )
        .is_ok();
        let _ = CloseHandle(handle);
        queried.then(|| String::from_utf16_lossy(&buffer[..size as usize]))
    }
}

fn wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

fn read_version_info(path: &str) -> VersionInfo {
    let file = wide(path);
    // SAFETY: `file` is NUL-terminated and `block` is sized by
    // GetFileVersionInfoSizeW; every pointer VerQueryValueW returns points
    // into `block`, which outlives the reads below.
    unsafe {
        let size = GetFileVersionInfoSizeW(PCWSTR(file.as_ptr()), None);
        if size == 0 {
            return VersionInfo::default();
        }
        let mut block = vec![0u8; size as usize];
        if GetFileVersionInfoW(PCWSTR(file.as_ptr()), 0, size, block.as_mut_ptr().cast()).is_err() {
            return VersionInfo::default();
        }

        let translation = query_translation(&block).unwrap_or(DEFAULT_TRANSLATION);
        VersionInfo {
            version: query_string(&block, translation, "FileVersion")
                .or_else(|| query_string(&block, translation, "ProductVersion")),
            publisher: query_string(&block, translation, "CompanyName"),
            product: query_string(&block, translation, "ProductName"),
            description: query_string(&block, translation, "FileDescription"),
        }
    }
}

unsafe fn query_value(block: &[u8], sub_block: &str) -> Option<(*const c_void, u32)> {
    let sub_block = wide(sub_block);
    let mut buffer: *mut c_void = std::ptr::null_mut();
    let mut len: u32 = 0;
    let found = VerQueryValueW(block.as_ptr().cast(), PCWSTR(sub_block.as_ptr()), &mut buffer, &mut len)
        .as_bool();
    (found && !buffer.is_null() && len > 0).then_some((buffer as *const c_void, len))
}

unsafe fn query_translation(block: &[u8]) -> Option<(u16, u16)> {
    let (buffer, len) = query_value(block, "\\VarFileInfo\\Translation")?;
    if len < 4 {
        return None;
    }
    let pair = std::slice::from_raw_parts(buffer as *const u16, 2);
    Some((pair[0], pair[1]))
}

unsafe fn query_string(block: &[u8], (language, codepage): (u16, u16), field: &str) -> Option<String> {
    let sub_block = format!("\\StringFileInfo\\{:04x}{:04x}\\{}", language, codepage, field);
    let (buffer, len) = query_value(block, &sub_block)?;
    let chars = std::slice::from_raw_parts(buffer as *const u16, len as usize);
    let text = String::from_utf16_lossy(chars);
    let text = text.trim_end_matches('\0').trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_image_is_not_cached() {
        let resolver = Win32AppResolver::new();
        let path = r"C:\DeskPulse\does-not-exist\ghost.exe";

        let info = resolver.version_info(path);
        assert!(info.version.is_none());
        assert!(info.product.is_none());
        assert!(!resolver.versions.contains_key(path));
    }

    #[test]
    fn test_existing_image_is_cached() {
        let resolver = Win32AppResolver::new();
        let exe = std::env::current_exe().unwrap();
        let path = exe.to_string_lossy().to_string();

        resolver.version_info(&path);
        assert!(resolver.versions.contains_key(&path));
    }
}
