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

//! Mouse facet: relative motion, buttons, and scroll over a `DeviceCore`.

use crate::abi::{self, InputEvent};
use crate::device::{Backend, DeviceCore};
use crate::errors::{DeviceError, Result};
use crate::preset::{Preset, PresetKind};
use std::cell::Cell;

/// Reads the real, on-screen cursor position so `move_to` can turn an
/// absolute target into the relative deltas uinput actually understands.
/// Mirrors the platform-dispatched display-connection pattern used
/// elsewhere in this crate for the same reason: the only thing that
/// differs across platforms is how you ask the window system where the
/// pointer is.
pub trait CursorOracle: Send {
    fn cursor_position(&self) -> Result<(i32, i32)>;
}

/// Used when no oracle is wired up (headless hosts, or simply not needed
/// because the caller only ever moves relatively).
pub struct NullCursorOracle;

impl CursorOracle for NullCursorOracle {
    fn cursor_position(&self) -> Result<(i32, i32)> {
        Err(DeviceError::NoCursorOracle)
    }
}

#[cfg(target_os = "linux")]
pub struct X11CursorOracle {
    display: *mut x11::xlib::Display,
}

#[cfg(target_os = "linux")]
unsafe impl Send for X11CursorOracle {}

#[cfg(target_os = "linux")]
impl X11CursorOracle {
    pub fn new() -> Result<Self> {
        let display = unsafe { x11::xlib::XOpenDisplay(std::ptr::null()) };
        if display.is_null() {
            return Err(DeviceError::NoCursorOracle);
        }
        Ok(X11CursorOracle { display })
    }
}

#[cfg(target_os = "linux")]
impl CursorOracle for X11CursorOracle {
    fn cursor_position(&self) -> Result<(i32, i32)> {
        unsafe {
            let root = x11::xlib::XDefaultRootWindow(self.display);
            let mut root_return = 0;
            let mut child_return = 0;
            let mut root_x = 0;
            let mut root_y = 0;
            let mut win_x = 0;
            let mut win_y = 0;
            let mut mask = 0;
            let ok = x11::xlib::XQueryPointer(
                self.display,
                root,
                &mut root_return,
                &mut child_return,
                &mut root_x,
                &mut root_y,
                &mut win_x,
                &mut win_y,
                &mut mask,
            );
            if ok == 0 {
                return Err(DeviceError::NoCursorOracle);
            }
            Ok((root_x, root_y))
        }
    }
}

#[cfg(target_os = "linux")]
impl Drop for X11CursorOracle {
    fn drop(&mut self) {
        unsafe {
            x11::xlib::XCloseDisplay(self.display);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Side,
    Extra,
    Forward,
    Back,
    Task,
}

impl MouseButton {
    fn code(self) -> u16 {
        match self {
            MouseButton::Left => abi::BTN_LEFT,
            MouseButton::Right => abi::BTN_RIGHT,
            MouseButton::Middle => abi::BTN_MIDDLE,
            MouseButton::Side => abi::BTN_SIDE,
            MouseButton::Extra => abi::BTN_EXTRA,
            MouseButton::Forward => abi::BTN_FORWARD,
            MouseButton::Back => abi::BTN_BACK,
            MouseButton::Task => abi::BTN_TASK,
        }
    }

    /// The raw scancode real mice emit alongside a button transition:
    /// `0x90001` for `BTN_LEFT`, incrementing with the button code.
    fn scancode(self) -> i32 {
        0x90001 + (self.code() as i32 - abi::BTN_LEFT as i32)
    }
}

pub struct Mouse<B: Backend + Send + 'static> {
    core: DeviceCore<B>,
    oracle: Box<dyn CursorOracle>,
    scancode_enabled: bool,
    hi_res: bool,
    position: Cell<(i32, i32)>,
    synced: Cell<bool>,
}

impl<B: Backend + Send + 'static> Mouse<B> {
    pub fn new(
        preset: &Preset,
        profile_id: &str,
        polling_hz: u32,
        oracle: Box<dyn CursorOracle>,
    ) -> Result<Self> {
        if preset.kind != PresetKind::Mouse {
            return Err(DeviceError::WrongKind);
        }
        let scancode_enabled = preset.capabilities.scancode();
        let hi_res = preset.capabilities.supports_high_res_scroll();
        let core = DeviceCore::create(preset, profile_id, polling_hz)?;
        Ok(Mouse {
            core,
            oracle,
            scancode_enabled,
            hi_res,
            position: Cell::new((0, 0)),
            synced: Cell::new(false),
        })
    }

    /// Read the real cursor position from the oracle and adopt it as the
    /// tracked position `move_to` computes deltas against. Fails with
    /// `NoCursorOracle` if none is available (e.g. headless).
    pub fn sync_position(&self) -> Result<(i32, i32)> {
        let pos = self.oracle.cursor_position()?;
        self.position.set(pos);
        self.synced.set(true);
        Ok(pos)
    }

    pub fn is_synced(&self) -> bool {
        self.synced.get()
    }

    /// Queue the deltas needed to move from the tracked position to
    /// `(x, y)` and update the tracked position. Does not flush; the next
    /// poll tick commits the frame.
    pub fn move_to(&self, x: i32, y: i32) -> Result<()> {
        let (last_x, last_y) = self.position.get();
        self.move_by(x - last_x, y - last_y)
    }

    /// Queue `(dx, dy)` and update the tracked position. Positive `dy` is
    /// down, matching `REL_Y`'s kernel convention (not screen-space "up is
    /// positive" math). Does not flush.
    pub fn move_by(&self, dx: i32, dy: i32) -> Result<()> {
        if dx != 0 {
            self.core.emit(InputEvent::new(abi::EV_REL, abi::REL_X, dx))?;
        }
        if dy != 0 {
            self.core.emit(InputEvent::new(abi::EV_REL, abi::REL_Y, dy))?;
        }
        let (last_x, last_y) = self.position.get();
        self.position.set((last_x + dx, last_y + dy));
        Ok(())
    }

    fn scancode_for(&self, button: MouseButton) -> Result<()> {
        if self.scancode_enabled {
            self.core
                .emit(InputEvent::new(abi::EV_MSC, abi::MSC_SCAN, button.scancode()))?;
        }
        Ok(())
    }

    pub fn press(&self, button: MouseButton) -> Result<()> {
        self.scancode_for(button)?;
        self.core.emit(InputEvent::new(abi::EV_KEY, button.code(), 1))
    }

    pub fn release(&self, button: MouseButton) -> Result<()> {
        self.scancode_for(button)?;
        self.core.emit(InputEvent::new(abi::EV_KEY, button.code(), 0))
    }

    /// Press, sleep `hold`, then release.
    pub fn click(&self, button: MouseButton, hold: std::time::Duration) -> Result<()> {
        self.press(button)?;
        std::thread::sleep(hold);
        self.release(button)
    }

    /// Scroll by `detents` (positive is away from the user). When the
    /// preset's axis set includes `REL_WHEEL_HI_RES`, emits the
    /// high-resolution axis first and the legacy `REL_WHEEL` axis second
    /// for compatibility; otherwise emits only the legacy axis.
    pub fn scroll(&self, detents: i32) -> Result<()> {
        if detents == 0 {
            return Ok(());
        }
        if self.core_supports_hi_res() {
            self.core.emit(InputEvent::new(
                abi::EV_REL,
                abi::REL_WHEEL_HI_RES,
                detents * abi::WHEEL_HI_RES_DETENT,
            ))?;
        }
        self.core
            .emit(InputEvent::new(abi::EV_REL, abi::REL_WHEEL, detents))
    }

    /// Symmetric to `scroll`, using the horizontal wheel axes.
    pub fn scroll_horizontal(&self, detents: i32) -> Result<()> {
        if detents == 0 {
            return Ok(());
        }
        if self.core_supports_hi_res() {
            self.core.emit(InputEvent::new(
                abi::EV_REL,
                abi::REL_HWHEEL_HI_RES,
                detents * abi::WHEEL_HI_RES_DETENT,
            ))?;
        }
        self.core
            .emit(InputEvent::new(abi::EV_REL, abi::REL_HWHEEL, detents))
    }

    fn core_supports_hi_res(&self) -> bool {
        // The preset's capability record is fixed at construction; stash
        // whether it supports hi-res once rather than threading the
        // preset through every call.
        self.hi_res
    }

    pub fn destroy(&self) {
        self.core.destroy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockBackend;
    use crate::preset::MOUSE_PRESETS;
    use std::time::Duration;

    #[test]
    fn wrong_kind_preset_is_rejected() {
        let preset = &crate::preset::KEYBOARD_PRESETS[0];
        let result = Mouse::<MockBackend>::new(preset, "test-profile", 125, Box::new(NullCursorOracle));
        assert!(matches!(result, Err(DeviceError::WrongKind)));
    }

    #[test]
    fn move_to_without_sync_uses_origin() {
        let preset = &MOUSE_PRESETS[0];
        let mouse =
            Mouse::<MockBackend>::new(preset, "test-profile", 125, Box::new(NullCursorOracle)).unwrap();
        assert!(!mouse.is_synced());
        mouse.move_to(10, 0).unwrap();
        assert_eq!(mouse.position.get(), (10, 0));
    }

    #[test]
    fn sync_position_without_oracle_fails() {
        let preset = &MOUSE_PRESETS[0];
        let mouse =
            Mouse::<MockBackend>::new(preset, "test-profile", 125, Box::new(NullCursorOracle)).unwrap();
        let err = mouse.sync_position();
        assert!(matches!(err, Err(DeviceError::NoCursorOracle)));
    }

    #[test]
    fn click_presses_then_releases() {
        let preset = &MOUSE_PRESETS[0];
        let mouse =
            Mouse::<MockBackend>::new(preset, "test-profile", 125, Box::new(NullCursorOracle)).unwrap();
        mouse.click(MouseButton::Left, Duration::from_millis(1)).unwrap();
        mouse.destroy();
    }

    #[test]
    fn button_scancode_matches_btn_left_formula() {
        assert_eq!(MouseButton::Left.scancode(), 0x90001);
        assert_eq!(MouseButton::Right.scancode(), 0x90002);
    }

    #[test]
    fn zero_detent_scroll_is_a_no_op() {
        let preset = &MOUSE_PRESETS[0];
        let mouse =
            Mouse::<MockBackend>::new(preset, "test-profile", 125, Box::new(NullCursorOracle)).unwrap();
        mouse.scroll(0).unwrap();
        mouse.destroy();
    }
}
