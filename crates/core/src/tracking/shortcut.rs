//! Shortcut detection
//!
//! Tracks modifier key state (left and right variants individually) and
//! matches each key-down against an injected table of known chords.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use deskpulse_domain::{KeyCode, ShortcutUsage};

/// Chords recognised when no custom table is supplied.
const DEFAULT_SHORTCUTS: &[&str] = &[
    // Editing
    "Ctrl+A", "Ctrl+C", "Ctrl+V", "Ctrl+X", "Ctrl+Z", "Ctrl+Y", "Ctrl+S", "Ctrl+F", "Ctrl+H",
    "Ctrl+P", "Ctrl+N", "Ctrl+O", "Ctrl+W", "Ctrl+T", "Ctrl+R", "Ctrl+B", "Ctrl+I", "Ctrl+U",
    "Ctrl+Shift+Z", "Ctrl+Shift+T", "Ctrl+Shift+N", "Ctrl+Shift+P", "Ctrl+Shift+F",
    // Navigation
    "Ctrl+Tab", "Ctrl+Shift+Tab", "Ctrl+Home", "Ctrl+End", "Ctrl+Left", "Ctrl+Right",
    "Alt+Left", "Alt+Right",
    // Window management
    "Alt+Tab", "Alt+Shift+Tab", "Alt+F4", "Ctrl+Alt+Delete", "Ctrl+Shift+Esc",
    "Win+D", "Win+E", "Win+L", "Win+R", "Win+Tab", "Win+Up", "Win+Down", "Win+Left",
    "Win+Right", "Win+Shift+S",
];

/// Immutable set of recognised chords in canonical `Ctrl+Alt+Shift+Win+Key` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutTable {
    chords: HashSet<String>,
}

impl ShortcutTable {
    pub fn new<I, S>(chords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { chords: chords.into_iter().map(Into::into).collect() }
    }

    pub fn contains(&self, chord: &str) -> bool {
        self.chords.contains(chord)
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }
}

impl Default for ShortcutTable {
    fn default() -> Self {
        Self::new(DEFAULT_SHORTCUTS.iter().copied())
    }
}

/// Held modifier keys, sided
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub left_ctrl: bool,
    pub right_ctrl: bool,
    pub left_alt: bool,
    pub right_alt: bool,
    pub left_shift: bool,
    pub right_shift: bool,
    pub left_win: bool,
    pub right_win: bool,
}

impl ModifierState {
    pub fn ctrl(&self) -> bool {
        self.left_ctrl || self.right_ctrl
    }

    pub fn alt(&self) -> bool {
        self.left_alt || self.right_alt
    }

    pub fn shift(&self) -> bool {
        self.left_shift || self.right_shift
    }

    pub fn win(&self) -> bool {
        self.left_win || self.right_win
    }

    pub fn any(&self) -> bool {
        self.ctrl() || self.alt() || self.shift() || self.win()
    }

    /// Apply a modifier key transition. Generic codes map to the left slot.
    fn set(&mut self, key: KeyCode, down: bool) {
        let slot = match key {
            KeyCode::CONTROL | KeyCode::LEFT_CONTROL => &mut self.left_ctrl,
            KeyCode::RIGHT_CONTROL => &mut self.right_ctrl,
            KeyCode::ALT | KeyCode::LEFT_ALT => &mut self.left_alt,
            KeyCode::RIGHT_ALT => &mut self.right_alt,
            KeyCode::SHIFT | KeyCode::LEFT_SHIFT => &mut self.left_shift,
            KeyCode::RIGHT_SHIFT => &mut self.right_shift,
            KeyCode::LEFT_WIN => &mut self.left_win,
            KeyCode::RIGHT_WIN => &mut self.right_win,
            _ => return,
        };
        *slot = down;
    }

    /// Canonical `Ctrl+Alt+Shift+Win+Key` string.
    pub fn chord(&self, key: KeyCode) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(5);
        if self.ctrl() {
            parts.push("Ctrl".into());
        }
        if self.alt() {
            parts.push("Alt".into());
        }
        if self.shift() {
            parts.push("Shift".into());
        }
        if self.win() {
            parts.push("Win".into());
        }
        parts.push(key.name());
        parts.join("+")
    }
}

/// Outcome of feeding a key-down to the detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRoute {
    /// A modifier key; not counted as typing.
    Modifier,
    /// A recognised chord; must not reach the burst detector.
    Shortcut(String),
    /// Ordinary typing.
    Typing,
}

#[derive(Debug, Default)]
pub struct ShortcutDetector {
    table: ShortcutTable,
    modifiers: ModifierState,
}

impl ShortcutDetector {
    pub fn new(table: ShortcutTable) -> Self {
        Self { table, modifiers: ModifierState::default() }
    }

    pub fn key_down(&mut self, key: KeyCode) -> KeyRoute {
        if key.is_modifier() {
            self.modifiers.set(key, true);
            return KeyRoute::Modifier;
        }
        if !self.modifiers.any() {
            return KeyRoute::Typing;
        }
        let chord = self.modifiers.chord(key);
        if self.table.contains(&chord) {
            KeyRoute::Shortcut(chord)
        } else {
            KeyRoute::Typing
        }
    }

    pub fn key_up(&mut self, key: KeyCode) {
        if key.is_modifier() {
            self.modifiers.set(key, false);
        }
    }

    pub fn modifiers(&self) -> ModifierState {
        self.modifiers
    }

    /// Build the usage record for a chord returned by [`Self::key_down`].
    pub fn usage(shortcut: String, process_name: &str, timestamp: DateTime<Utc>) -> ShortcutUsage {
        ShortcutUsage { shortcut, process_name: process_name.to_string(), timestamp }
    }
}
