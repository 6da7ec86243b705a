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

//! Capability catalog: which event bits a preset advertises to the kernel,
//! and how those bits get turned into `UI_SET_*BIT` ioctls before the device
//! is created. Also carries the form-factor/feature metadata real peripheral
//! listings advertise alongside their wire capabilities, even where that
//! metadata has no effect on the ioctl tape (e.g. DPI stage count, macro key
//! count) — it describes the device being impersonated, not just the bits
//! uinput needs.

use crate::abi;
use crate::device::Backend;
use crate::errors::{CapabilityBit, DeviceError, Result};

/// Keyboard form factor, mirroring how these are actually marketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFactor {
    Full,
    Tkl,
    SixtyPercent,
    SixtyFivePercent,
    SeventyFivePercent,
    Virtual,
}

#[derive(Clone, Copy)]
pub struct MouseCapabilities {
    pub keys: &'static [u16],
    pub rel: &'static [u16],
    pub scancode: bool,
    /// Number of selectable DPI stages. Presentational: it has no uinput
    /// ioctl of its own, the way a mouse's on-board DPI button doesn't
    /// change which `REL_*` bits it advertises.
    pub dpi_stages: u8,
}

#[derive(Clone, Copy)]
pub struct KeyboardCapabilities {
    pub keys: &'static [u16],
    pub scancode: bool,
    pub form_factor: FormFactor,
    pub numpad: bool,
    pub media_keys: bool,
    pub macro_keys: bool,
    pub macro_key_count: u8,
    pub leds: bool,
    pub key_repeat: bool,
}

#[derive(Clone, Copy)]
pub enum CapabilityRecord {
    Mouse(MouseCapabilities),
    Keyboard(KeyboardCapabilities),
}

impl CapabilityRecord {
    /// Relative-motion mouse: left/right/middle/side/extra/forward/back
    /// buttons, X/Y motion, legacy and high-resolution wheel axes.
    pub const MOUSE: CapabilityRecord = CapabilityRecord::Mouse(MouseCapabilities {
        keys: &[
            abi::BTN_LEFT,
            abi::BTN_RIGHT,
            abi::BTN_MIDDLE,
            abi::BTN_SIDE,
            abi::BTN_EXTRA,
            abi::BTN_FORWARD,
            abi::BTN_BACK,
            abi::BTN_TASK,
        ],
        rel: &[
            abi::REL_X,
            abi::REL_Y,
            abi::REL_WHEEL,
            abi::REL_HWHEEL,
            abi::REL_WHEEL_HI_RES,
            abi::REL_HWHEEL_HI_RES,
        ],
        scancode: true,
        dpi_stages: 5,
    });

    /// Full keyboard: every key code the mapper can produce, no macro pad,
    /// no media row.
    pub const KEYBOARD: CapabilityRecord = CapabilityRecord::Keyboard(KeyboardCapabilities {
        keys: crate::keycode::ALL_KEY_CODES,
        scancode: true,
        form_factor: FormFactor::Full,
        numpad: true,
        media_keys: false,
        macro_keys: false,
        macro_key_count: 0,
        leds: false,
        key_repeat: true,
    });

    pub fn keys(&self) -> &'static [u16] {
        match self {
            CapabilityRecord::Mouse(m) => m.keys,
            CapabilityRecord::Keyboard(k) => k.keys,
        }
    }

    pub fn rel(&self) -> &'static [u16] {
        match self {
            CapabilityRecord::Mouse(m) => m.rel,
            CapabilityRecord::Keyboard(_) => &[],
        }
    }

    pub fn scancode(&self) -> bool {
        match self {
            CapabilityRecord::Mouse(m) => m.scancode,
            CapabilityRecord::Keyboard(k) => k.scancode,
        }
    }

    pub fn supports_high_res_scroll(&self) -> bool {
        self.rel().contains(&abi::REL_WHEEL_HI_RES)
    }

    /// Configure a freshly-opened uinput fd with the `UI_SET_EVBIT` /
    /// `UI_SET_KEYBIT` / `UI_SET_RELBIT` / `UI_SET_MSCBIT` ioctls this
    /// capability record needs, in the order the kernel documentation
    /// recommends: the umbrella `EVBIT` before the per-code bits.
    pub fn configure<B: Backend>(&self, backend: &B) -> Result<()> {
        let keys = self.keys();
        if !keys.is_empty() {
            self.set_evbit(backend, abi::EV_KEY)?;
            for &code in keys {
                backend
                    .ioctl_int(abi::UI_SET_KEYBIT, code as i32)
                    .map_err(|errno| DeviceError::CapabilityConfigFailed {
                        which: CapabilityBit::KeyBit,
                        errno,
                    })?;
            }
        }
        let rel = self.rel();
        if !rel.is_empty() {
            self.set_evbit(backend, abi::EV_REL)?;
            for &code in rel {
                backend
                    .ioctl_int(abi::UI_SET_RELBIT, code as i32)
                    .map_err(|errno| DeviceError::CapabilityConfigFailed {
                        which: CapabilityBit::RelBit,
                        errno,
                    })?;
            }
        }
        if self.scancode() {
            self.set_evbit(backend, abi::EV_MSC)?;
            backend
                .ioctl_int(abi::UI_SET_MSCBIT, abi::MSC_SCAN as i32)
                .map_err(|errno| DeviceError::CapabilityConfigFailed {
                    which: CapabilityBit::MscBit,
                    errno,
                })?;
        }
        Ok(())
    }

    fn set_evbit<B: Backend>(&self, backend: &B, ev: u16) -> Result<()> {
        backend
            .ioctl_int(abi::UI_SET_EVBIT, ev as i32)
            .map_err(|errno| DeviceError::CapabilityConfigFailed {
                which: CapabilityBit::EvBit,
                errno,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockBackend;

    #[test]
    fn mouse_capabilities_issue_expected_ioctl_tape() {
        let backend = MockBackend::new();
        CapabilityRecord::MOUSE.configure(&backend).unwrap();
        let tape = backend.tape();
        assert!(tape
            .iter()
            .any(|c| c.request == abi::UI_SET_EVBIT && c.arg == abi::EV_KEY as i32));
        assert!(tape
            .iter()
            .any(|c| c.request == abi::UI_SET_KEYBIT && c.arg == abi::BTN_LEFT as i32));
        assert!(tape
            .iter()
            .any(|c| c.request == abi::UI_SET_RELBIT && c.arg == abi::REL_X as i32));
        assert!(tape
            .iter()
            .any(|c| c.request == abi::UI_SET_MSCBIT && c.arg == abi::MSC_SCAN as i32));
    }

    #[test]
    fn keyboard_capabilities_skip_rel_bit() {
        let backend = MockBackend::new();
        CapabilityRecord::KEYBOARD.configure(&backend).unwrap();
        let tape = backend.tape();
        assert!(!tape.iter().any(|c| c.request == abi::UI_SET_RELBIT));
        assert!(tape
            .iter()
            .any(|c| c.request == abi::UI_SET_MSCBIT && c.arg == abi::MSC_SCAN as i32));
    }

    #[test]
    fn mouse_supports_high_res_scroll() {
        assert!(CapabilityRecord::MOUSE.supports_high_res_scroll());
    }

    #[test]
    fn keyboard_capabilities_carry_form_factor_metadata() {
        match CapabilityRecord::KEYBOARD {
            CapabilityRecord::Keyboard(k) => assert_eq!(k.form_factor, FormFactor::Full),
            CapabilityRecord::Mouse(_) => panic!("expected a keyboard record"),
        }
    }
}
