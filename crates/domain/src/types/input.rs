//! Raw input events produced by the platform input adapter
//!
//! These records are ephemeral: created inside OS hook callbacks, drained by
//! the capture consumer and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Virtual-key code as reported by the OS keyboard hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const BACKSPACE: Self = Self(0x08);
    pub const TAB: Self = Self(0x09);
    pub const ENTER: Self = Self(0x0D);
    pub const SHIFT: Self = Self(0x10);
    pub const CONTROL: Self = Self(0x11);
    pub const ALT: Self = Self(0x12);
    pub const ESCAPE: Self = Self(0x1B);
    pub const SPACE: Self = Self(0x20);
    pub const DELETE: Self = Self(0x2E);
    pub const LEFT_WIN: Self = Self(0x5B);
    pub const RIGHT_WIN: Self = Self(0x5C);
    pub const LEFT_SHIFT: Self = Self(0xA0);
    pub const RIGHT_SHIFT: Self = Self(0xA1);
    pub const LEFT_CONTROL: Self = Self(0xA2);
    pub const RIGHT_CONTROL: Self = Self(0xA3);
    pub const LEFT_ALT: Self = Self(0xA4);
    pub const RIGHT_ALT: Self = Self(0xA5);

    /// Key code for an ASCII letter or digit (`'a'`, `'C'`, `'7'`).
    pub fn from_char(c: char) -> Option<Self> {
        let upper = c.to_ascii_uppercase();
        if upper.is_ascii_uppercase() || upper.is_ascii_digit() {
            Some(Self(u32::from(upper)))
        } else {
            None
        }
    }

    /// True for Shift/Ctrl/Alt/Win in either their generic or sided form.
    pub fn is_modifier(self) -> bool {
        matches!(self.0, 0x10..=0x12 | 0x5B | 0x5C | 0xA0..=0xA5)
    }

    /// Canonical key name used in shortcut strings and key-frequency maps.
    pub fn name(self) -> String {
        let code = self.0;
        match code {
            0x30..=0x39 | 0x41..=0x5A => char::from_u32(code).map(String::from).unwrap_or_default(),
            0x70..=0x87 => format!("F{}", code - 0x6F),
            0x60..=0x69 => format!("Num{}", code - 0x60),
            0x08 => "Backspace".into(),
            0x09 => "Tab".into(),
            0x0D => "Enter".into(),
            0x10 | 0xA0 | 0xA1 => "Shift".into(),
            0x11 | 0xA2 | 0xA3 => "Ctrl".into(),
            0x12 | 0xA4 | 0xA5 => "Alt".into(),
            0x13 => "Pause".into(),
            0x14 => "CapsLock".into(),
            0x1B => "Esc".into(),
            0x20 => "Space".into(),
            0x21 => "PageUp".into(),
            0x22 => "PageDown".into(),
            0x23 => "End".into(),
            0x24 => "Home".into(),
            0x25 => "Left".into(),
            0x26 => "Up".into(),
            0x27 => "Right".into(),
            0x28 => "Down".into(),
            0x2C => "PrintScreen".into(),
            0x2D => "Insert".into(),
            0x2E => "Delete".into(),
            0x5B | 0x5C => "Win".into(),
            0xBA => ";".into(),
            0xBB => "=".into(),
            0xBC => ",".into(),
            0xBD => "-".into(),
            0xBE => ".".into(),
            0xBF => "/".into(),
            0xC0 => "`".into(),
            0xDB => "[".into(),
            0xDC => "\\".into(),
            0xDD => "]".into(),
            0xDE => "'".into(),
            other => format!("VK{other:02X}"),
        }
    }
}

/// Mouse button reported by the mouse hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl_domain_status_conversions!(MouseButton {
    Left => "left",
    Right => "right",
    Middle => "middle",
});

/// Screen position in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in pixels.
    pub fn distance_to(self, other: Self) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        dx.hypot(dy)
    }
}

/// Kind and payload of a raw input event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawInputKind {
    KeyDown { key: KeyCode },
    KeyUp { key: KeyCode },
    MouseMove { position: ScreenPoint },
    MouseClick { button: MouseButton, position: ScreenPoint },
    MouseScroll { delta: i32 },
}

/// Timestamped raw input record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawInputEvent {
    pub kind: RawInputKind,
    pub timestamp: DateTime<Utc>,
}

impl RawInputEvent {
    pub const fn new(kind: RawInputKind, timestamp: DateTime<Utc>) -> Self {
        Self { kind, timestamp }
    }
}

/// Opaque OS window reference (an `HWND` on Windows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WindowHandle(pub isize);

/// Everything the input adapter pushes onto the capture queue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CaptureEvent {
    Input(RawInputEvent),
    ForegroundChanged { window: WindowHandle, timestamp: DateTime<Utc> },
}

impl CaptureEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Input(event) => event.timestamp,
            Self::ForegroundChanged { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(KeyCode::from_char('c').unwrap().name(), "C");
        assert_eq!(KeyCode(0x70).name(), "F1");
        assert_eq!(KeyCode(0x7B).name(), "F12");
        assert_eq!(KeyCode::TAB.name(), "Tab");
        assert_eq!(KeyCode::LEFT_WIN.name(), "Win");
        assert_eq!(KeyCode(0xFF).name(), "VKFF");
    }

    #[test]
    fn test_modifier_detection() {
        assert!(KeyCode::LEFT_CONTROL.is_modifier());
        assert!(KeyCode::ALT.is_modifier());
        assert!(KeyCode::RIGHT_WIN.is_modifier());
        assert!(!KeyCode::from_char('a').unwrap().is_modifier());
        assert!(!KeyCode::TAB.is_modifier());
    }

    #[test]
    fn test_point_distance() {
        assert!((ScreenPoint::new(0, 0).distance_to(ScreenPoint::new(3, 4)) - 5.0).abs() < 1e-9);
    }
}
