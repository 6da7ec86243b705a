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

//! Physical path generator.
//!
//! `UI_SET_PHYS` lets a uinput device claim a `phys` string the way a real
//! USB HID device would (`usb-0000:00:14.0-1/input0`). Userspace tools that
//! distinguish otherwise-identical devices by `phys` (multi-mouse setups,
//! udev rules keyed on port) need that string to look plausible and to stay
//! stable for a given profile across runs, so both the PCI slot and the hub
//! port are derived deterministically from a profile id with SHA-256 rather
//! than left to `/dev/urandom`. A mouse/keyboard pair sharing a profile id
//! lands on the same PCI slot but adjacent ports, the way a real keyboard
//! and the mouse plugged in next to it would.

use crate::errors::{DeviceError, Result};
use crate::preset::PresetKind;
use sha2::{Digest, Sha256};

/// Upper bound enforced by the kernel: `UI_SET_PHYS` copies the string into
/// a fixed-size kernel buffer sized the same as the device name.
const MAX_PHYS_LEN: usize = crate::abi::UINPUT_MAX_NAME_SIZE;

/// PCI slots real USB controllers commonly occupy on a desktop chipset.
const COMMON_USB_SLOTS: [u8; 4] = [0x14, 0x1a, 0x1d, 0x1f];

fn kind_tag(kind: PresetKind) -> &'static str {
    match kind {
        PresetKind::Mouse => "MOUSE",
        PresetKind::Keyboard => "KEYBOARD",
    }
}

fn hash_u32_be(input: &str) -> u32 {
    let digest = Sha256::digest(input.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Derive a `usb-0000:00:XX.0-P/input0`-shaped physical path for `profile_id`
/// and `kind`.
///
/// The PCI slot is keyed only on `profile_id`, so a mouse and keyboard
/// sharing a profile id land on the same simulated USB controller. The port
/// is keyed on `profile_id` and `kind`, so they still get distinct port
/// numbers; a keyboard's port is additionally offset by one from what the
/// same profile id would give a mouse, so a paired keyboard lands on the
/// port adjacent to its mouse rather than risking a collision.
pub fn generate(profile_id: &str, kind: PresetKind) -> Result<String> {
    let slot_hash = hash_u32_be(&format!("{}:usb-controller", profile_id));
    let slot = COMMON_USB_SLOTS[(slot_hash as usize) % COMMON_USB_SLOTS.len()];

    let port_hash = hash_u32_be(&format!("{}:usb-port:{}", profile_id, kind_tag(kind)));
    let mut port = 1 + (port_hash % 10);
    if kind == PresetKind::Keyboard {
        port = 1 + ((port - 1 + 1) % 10);
    }

    let path = format!("usb-0000:00:{:02x}.0-{}/input0", slot, port);
    if path.len() >= MAX_PHYS_LEN {
        return Err(DeviceError::PhysTooLong { path });
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_profile_and_kind_yields_same_path() {
        let a = generate("alpha", PresetKind::Mouse).unwrap();
        let b = generate("alpha", PresetKind::Mouse).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mouse_and_keyboard_differ_in_port_for_the_same_profile() {
        let mouse = generate("alpha", PresetKind::Mouse).unwrap();
        let keyboard = generate("alpha", PresetKind::Keyboard).unwrap();
        assert_ne!(mouse, keyboard);
        let mouse_slot = &mouse[8..13];
        let keyboard_slot = &keyboard[8..13];
        assert_eq!(mouse_slot, keyboard_slot);
    }

    #[test]
    fn different_profiles_usually_differ() {
        let a = generate("alpha", PresetKind::Mouse).unwrap();
        let b = generate("bravo", PresetKind::Mouse).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn path_matches_expected_shape() {
        let path = generate("alpha", PresetKind::Mouse).unwrap();
        assert!(path.starts_with("usb-0000:00:"));
        assert!(path.ends_with("/input0"));
    }

    #[test]
    fn path_always_fits_the_kernel_buffer() {
        let path = generate("any profile id, short or long", PresetKind::Mouse).unwrap();
        assert!(path.len() < MAX_PHYS_LEN);
    }
}
