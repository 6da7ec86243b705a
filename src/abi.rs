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

//! Kernel ABI constants for `/dev/uinput`.
//!
//! Everything here mirrors `linux/uinput.h` and `linux/input-event-codes.h`.
//! The ioctl request numbers are computed with the same `_IO`/`_IOW` encoding
//! the kernel headers use rather than copied as magic numbers, so the
//! relationship between struct size and request number stays visible.

use std::mem::size_of;

const UINPUT_IOCTL_BASE: u64 = b'U' as u64;

const IOC_NRBITS: u64 = 8;
const IOC_TYPEBITS: u64 = 8;
const IOC_SIZEBITS: u64 = 14;

const IOC_NRSHIFT: u64 = 0;
const IOC_TYPESHIFT: u64 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u64 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u64 = IOC_SIZESHIFT + IOC_SIZEBITS;

const IOC_NONE: u64 = 0;
const IOC_WRITE: u64 = 1;

const fn ioc(dir: u64, ty: u64, nr: u64, size: u64) -> u64 {
    (dir << IOC_DIRSHIFT) | (ty << IOC_TYPESHIFT) | (nr << IOC_NRSHIFT) | (size << IOC_SIZESHIFT)
}

const fn io(nr: u64) -> u64 {
    ioc(IOC_NONE, UINPUT_IOCTL_BASE, nr, 0)
}

const fn iow(nr: u64, size: u64) -> u64 {
    ioc(IOC_WRITE, UINPUT_IOCTL_BASE, nr, size)
}

pub const UI_DEV_CREATE: u64 = io(1);
pub const UI_DEV_DESTROY: u64 = io(2);
pub const UI_DEV_SETUP: u64 = iow(3, size_of::<UinputSetup>() as u64);
pub const UI_SET_EVBIT: u64 = iow(100, size_of::<i32>() as u64);
pub const UI_SET_KEYBIT: u64 = iow(101, size_of::<i32>() as u64);
pub const UI_SET_RELBIT: u64 = iow(102, size_of::<i32>() as u64);
pub const UI_SET_MSCBIT: u64 = iow(104, size_of::<i32>() as u64);
pub const UI_SET_PHYS: u64 = iow(108, size_of::<usize>() as u64);

/// Event types (`linux/input-event-codes.h`).
pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_REL: u16 = 0x02;
pub const EV_MSC: u16 = 0x04;

pub const SYN_REPORT: u16 = 0;

pub const MSC_SCAN: u16 = 0x04;

pub const REL_X: u16 = 0x00;
pub const REL_Y: u16 = 0x01;
pub const REL_HWHEEL: u16 = 0x06;
pub const REL_WHEEL: u16 = 0x08;
pub const REL_WHEEL_HI_RES: u16 = 0x0b;
pub const REL_HWHEEL_HI_RES: u16 = 0x0c;

/// One "detent" of a physical scroll wheel in high-resolution units.
pub const WHEEL_HI_RES_DETENT: i32 = 120;

pub const BTN_LEFT: u16 = 0x110;
pub const BTN_RIGHT: u16 = 0x111;
pub const BTN_MIDDLE: u16 = 0x112;
pub const BTN_SIDE: u16 = 0x113;
pub const BTN_EXTRA: u16 = 0x114;
pub const BTN_FORWARD: u16 = 0x115;
pub const BTN_BACK: u16 = 0x116;
pub const BTN_TASK: u16 = 0x117;

/// Bus types (`linux/input.h`).
pub const BUS_USB: u16 = 0x03;
pub const BUS_BLUETOOTH: u16 = 0x05;
pub const BUS_VIRTUAL: u16 = 0x06;

pub const UINPUT_MAX_NAME_SIZE: usize = 80;

/// `struct input_event`, 24 bytes on a 64-bit kernel (two `long` timestamp
/// fields are `i64` there, not the 32-bit `time_t` of 32-bit kernels).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct InputEvent {
    pub tv_sec: i64,
    pub tv_usec: i64,
    pub type_: u16,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    pub fn new(type_: u16, code: u16, value: i32) -> Self {
        InputEvent {
            tv_sec: 0,
            tv_usec: 0,
            type_,
            code,
            value,
        }
    }

    pub fn syn_report() -> Self {
        InputEvent::new(EV_SYN, SYN_REPORT, 0)
    }

    /// Raw bytes of this event, in the exact layout the kernel expects on
    /// a `write()` to the uinput fd. The timestamp is always zeroed; the
    /// kernel fills it in on ingestion.
    pub fn as_bytes(&self) -> &[u8] {
        unsafe {
            std::slice::from_raw_parts(
                (self as *const InputEvent) as *const u8,
                size_of::<InputEvent>(),
            )
        }
    }
}

/// `struct input_id` (`linux/input.h`).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct InputId {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

/// `struct uinput_setup` (`linux/uinput.h`), 92 bytes. This is the modern
/// setup struct used with `UI_DEV_SETUP`, distinct from the older 84-byte
/// `uinput_user_dev` some example code still targets; we match the kernel's
/// current ABI rather than the legacy one.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct UinputSetup {
    pub id: InputId,
    pub name: [u8; UINPUT_MAX_NAME_SIZE],
    pub ff_effects_max: u32,
}

impl UinputSetup {
    pub fn new(id: InputId, name: &str) -> Self {
        let mut name_buf = [0u8; UINPUT_MAX_NAME_SIZE];
        let bytes = name.as_bytes();
        let len = bytes.len().min(UINPUT_MAX_NAME_SIZE - 1);
        name_buf[..len].copy_from_slice(&bytes[..len]);
        UinputSetup {
            id,
            name: name_buf,
            ff_effects_max: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe {
            std::slice::from_raw_parts(
                (self as *const UinputSetup) as *const u8,
                size_of::<UinputSetup>(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_is_24_bytes() {
        assert_eq!(size_of::<InputEvent>(), 24);
    }

    #[test]
    fn setup_is_92_bytes() {
        assert_eq!(size_of::<UinputSetup>(), 92);
    }

    #[test]
    fn ioctl_numbers_match_kernel_headers() {
        assert_eq!(UI_DEV_CREATE, 0x5501);
        assert_eq!(UI_DEV_DESTROY, 0x5502);
        assert_eq!(UI_SET_EVBIT, 0x4004_5564);
        assert_eq!(UI_SET_KEYBIT, 0x4004_5565);
        assert_eq!(UI_SET_RELBIT, 0x4004_5566);
        assert_eq!(UI_DEV_SETUP, 0x405c_5503);
    }

    #[test]
    fn name_is_nul_terminated_and_truncated_safely() {
        let long_name = "x".repeat(200);
        let setup = UinputSetup::new(InputId::default(), &long_name);
        assert_eq!(setup.name.len(), UINPUT_MAX_NAME_SIZE);
        assert_eq!(setup.name[UINPUT_MAX_NAME_SIZE - 1], 0);
    }
}
