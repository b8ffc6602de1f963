// src/input.rs
//! Gamepad-style input events and the keyboard pad that produces them.

use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};

use crate::error::{FanPadError, Result};

// --- Events ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A button went down; indices follow the Xbox controller layout.
    ButtonDown(u8),
    /// An axis moved; `value` is in `-1.0..=1.0`.
    AxisMotion { axis: u8, value: f32 },
}

/// A source of input devices that may come and go while the program runs.
///
/// `initialize` is called once before anything else and `shutdown` once at
/// the end; the other methods are polled from the dispatch loop.
pub trait InputSource {
    fn initialize(&mut self) -> Result<()>;
    fn shutdown(&mut self);
    /// How many devices are currently attached.
    fn device_count(&mut self) -> usize;
    /// Opens device `index` and returns its display name.
    fn open(&mut self, index: usize) -> Result<String>;
    fn close(&mut self);
    /// Drains the events queued since the last call without blocking.
    fn poll(&mut self) -> Result<Vec<InputEvent>>;
}

// --- Keyboard Pad ---

/// Key bindings shown to the user when the keyboard pad starts.
pub const KEYBOARD_HELP: &[(&str, &str)] = &[
    ("a", "buzzer"),
    ("b", "child lock"),
    ("x", "mode"),
    ("y", "LED indicators"),
    ("q / e", "rotate left / right"),
    (", / .", "rotate left / right (stick)"),
    ("tab", "status"),
    ("enter / p", "power"),
    ("o", "oscillation"),
    ("left / right", "angle down / up"),
    ("up / down", "speed up / down"),
    ("esc / ctrl-c", "exit"),
];

/// Restores cooked terminal mode when dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode()
            .map_err(|e| FanPadError::Terminal(format!("failed to enable raw mode: {}", e)))?;
        Ok(RawModeGuard)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Warning: Failed to restore terminal mode: {}", e);
        }
    }
}

/// Turns the terminal keyboard into a virtual gamepad.
#[derive(Default)]
pub struct KeyboardPad {
    raw_mode: Option<RawModeGuard>,
    open: bool,
}

impl KeyboardPad {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputSource for KeyboardPad {
    fn initialize(&mut self) -> Result<()> {
        if self.raw_mode.is_none() {
            self.raw_mode = Some(RawModeGuard::enable()?);
            tracing::debug!("keyboard pad initialized");
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.open = false;
        self.raw_mode = None;
    }

    fn device_count(&mut self) -> usize {
        usize::from(self.raw_mode.is_some())
    }

    fn open(&mut self, index: usize) -> Result<String> {
        if index != 0 || self.raw_mode.is_none() {
            return Err(FanPadError::Terminal(format!("no keyboard pad at index {}", index)));
        }
        self.open = true;
        Ok("Keyboard (virtual gamepad)".to_string())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn poll(&mut self) -> Result<Vec<InputEvent>> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO)
            .map_err(|e| FanPadError::Terminal(format!("failed to poll keyboard: {}", e)))?
        {
            let read = event::read()
                .map_err(|e| FanPadError::Terminal(format!("failed to read keyboard: {}", e)))?;
            if !self.open {
                continue;
            }
            if let Event::Key(key) = read {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(event) = key_to_event(key) {
                    events.push(event);
                }
            }
        }
        Ok(events)
    }
}

/// Maps a key press to the gamepad event it stands for.
pub fn key_to_event(key: KeyEvent) -> Option<InputEvent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(InputEvent::ButtonDown(8)),
            _ => None,
        };
    }

    let button = match key.code {
        KeyCode::Char('a') => 0,
        KeyCode::Char('b') => 1,
        KeyCode::Char('x') => 2,
        KeyCode::Char('y') => 3,
        KeyCode::Char('q') => 4,
        KeyCode::Char('e') => 5,
        KeyCode::Tab => 6,
        KeyCode::Enter | KeyCode::Char('p') => 7,
        KeyCode::Esc => 8,
        KeyCode::Char('o') => 10,
        KeyCode::Left => 11,
        KeyCode::Right => 12,
        KeyCode::Up => 13,
        KeyCode::Down => 14,
        KeyCode::Char(',') => return Some(InputEvent::AxisMotion { axis: 3, value: -1.0 }),
        KeyCode::Char('.') => return Some(InputEvent::AxisMotion { axis: 3, value: 1.0 }),
        _ => return None,
    };
    Some(InputEvent::ButtonDown(button))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn face_buttons_and_dpad_map_to_xbox_indices() {
        assert_eq!(key_to_event(press(KeyCode::Char('a'))), Some(InputEvent::ButtonDown(0)));
        assert_eq!(key_to_event(press(KeyCode::Enter)), Some(InputEvent::ButtonDown(7)));
        assert_eq!(key_to_event(press(KeyCode::Up)), Some(InputEvent::ButtonDown(13)));
        assert_eq!(key_to_event(press(KeyCode::Down)), Some(InputEvent::ButtonDown(14)));
    }

    #[test]
    fn stick_keys_emit_full_axis_deflection() {
        assert_eq!(
            key_to_event(press(KeyCode::Char(','))),
            Some(InputEvent::AxisMotion { axis: 3, value: -1.0 })
        );
        assert_eq!(
            key_to_event(press(KeyCode::Char('.'))),
            Some(InputEvent::AxisMotion { axis: 3, value: 1.0 })
        );
    }

    #[test]
    fn ctrl_c_and_escape_exit() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_event(ctrl_c), Some(InputEvent::ButtonDown(8)));
        assert_eq!(key_to_event(press(KeyCode::Esc)), Some(InputEvent::ButtonDown(8)));
    }

    #[test]
    fn unbound_keys_are_ignored() {
        assert_eq!(key_to_event(press(KeyCode::Char('z'))), None);
        let ctrl_a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(key_to_event(ctrl_a), None);
    }

    #[test]
    fn uninitialized_pad_has_no_devices() {
        let mut pad = KeyboardPad::new();
        assert_eq!(pad.device_count(), 0);
        assert!(pad.open(0).is_err());
    }
}
