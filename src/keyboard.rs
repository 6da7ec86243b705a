/* Copyright (C) 2024 by Jacob Alexander
 *
 * This file is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This file is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this file.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Keyboard facet: raw key press/release plus character-level typing built
//! on top of the key code mapper.

use crate::abi::InputEvent;
use crate::abi;
use crate::device::{Backend, DeviceCore};
use crate::errors::{DeviceError, Result};
use crate::keycode::{self, KEY_LEFTSHIFT};
use crate::preset::{Preset, PresetKind};
use std::time::Duration;

/// Gap held between a modifier press and the key it modifies, and between
/// the key release and the modifier release, when typing a shifted
/// character. Matches the cadence real keyboard firmware debounces at.
const SHIFT_GAP: Duration = Duration::from_millis(10);

pub struct Keyboard<B: Backend + Send + 'static> {
    core: DeviceCore<B>,
    scancode_enabled: bool,
}

impl<B: Backend + Send + 'static> Keyboard<B> {
    pub fn new(preset: &Preset, profile_id: &str, polling_hz: u32) -> Result<Self> {
        if preset.kind != PresetKind::Keyboard {
            return Err(DeviceError::WrongKind);
        }
        let scancode_enabled = preset.capabilities.scancode();
        Ok(Keyboard {
            core: DeviceCore::create(preset, profile_id, polling_hz)?,
            scancode_enabled,
        })
    }

    fn scancode_for(&self, code: u16) -> Result<()> {
        if self.scancode_enabled {
            self.core
                .emit(InputEvent::new(abi::EV_MSC, abi::MSC_SCAN, code as i32))?;
        }
        Ok(())
    }

    pub fn press(&self, code: u16) -> Result<()> {
        self.scancode_for(code)?;
        self.core.emit(InputEvent::new(abi::EV_KEY, code, 1))
    }

    pub fn release(&self, code: u16) -> Result<()> {
        self.scancode_for(code)?;
        self.core.emit(InputEvent::new(abi::EV_KEY, code, 0))
    }

    /// Press, hold for `hold`, then release.
    pub fn tap(&self, code: u16, hold: Duration) -> Result<()> {
        self.press(code)?;
        std::thread::sleep(hold);
        self.release(code)
    }

    /// Press/release the key sequence (with shift, if needed) for one
    /// character, holding the base key for `hold`. A shifted character
    /// presses the modifier, waits `SHIFT_GAP`, taps the key, waits
    /// `SHIFT_GAP` again, then releases the modifier.
    pub fn type_char(&self, c: char, hold: Duration) -> Result<()> {
        let seq = keycode::char_to_key(c)?;
        if seq.shift {
            self.press(KEY_LEFTSHIFT)?;
            std::thread::sleep(SHIFT_GAP);
        }
        let result = self.tap(seq.code, hold);
        if seq.shift {
            std::thread::sleep(SHIFT_GAP);
            self.release(KEY_LEFTSHIFT)?;
        }
        result
    }

    pub fn type_str(&self, s: &str, hold: Duration) -> Result<()> {
        for c in s.chars() {
            self.type_char(c, hold)?;
        }
        Ok(())
    }

    pub fn destroy(&self) {
        self.core.destroy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockBackend;
    use crate::preset::{KEYBOARD_PRESETS, MOUSE_PRESETS};

    #[test]
    fn wrong_kind_preset_is_rejected() {
        let preset = &MOUSE_PRESETS[0];
        let result = Keyboard::<MockBackend>::new(preset, "test-profile", 1000);
        assert!(matches!(result, Err(DeviceError::WrongKind)));
    }

    #[test]
    fn type_str_rejects_first_unmappable_character() {
        let preset = &KEYBOARD_PRESETS[0];
        let keyboard = Keyboard::<MockBackend>::new(preset, "test-profile", 1000).unwrap();
        let result = keyboard.type_str("ok \u{1F600}", Duration::from_millis(1));
        assert!(matches!(result, Err(DeviceError::UnmappableCharacter { .. })));
        keyboard.destroy();
    }

    #[test]
    fn type_str_accepts_plain_ascii() {
        let preset = &KEYBOARD_PRESETS[0];
        let keyboard = Keyboard::<MockBackend>::new(preset, "test-profile", 1000).unwrap();
        keyboard.type_str("Hello, World!", Duration::from_millis(1)).unwrap();
        keyboard.destroy();
    }
}
