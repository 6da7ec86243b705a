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

//! Stable error kinds for the virtual HID engine.
//!
//! Kept as a plain enum (rather than an opaque boxed error) so that tests can
//! match on the exact failure that occurred, per the error handling design.

use std::fmt;

/// Which capability-configuration ioctl failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityBit {
    EvBit,
    KeyBit,
    RelBit,
    MscBit,
}

impl fmt::Display for CapabilityBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapabilityBit::EvBit => "UI_SET_EVBIT",
            CapabilityBit::KeyBit => "UI_SET_KEYBIT",
            CapabilityBit::RelBit => "UI_SET_RELBIT",
            CapabilityBit::MscBit => "UI_SET_MSCBIT",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug)]
pub enum DeviceError {
    /// `/dev/uinput` could not be opened.
    OpenFailed { errno: i32 },
    /// One of the `UI_SET_*BIT` ioctls failed.
    CapabilityConfigFailed { which: CapabilityBit, errno: i32 },
    /// `UI_DEV_SETUP` failed.
    SetupFailed { errno: i32 },
    /// `UI_SET_PHYS` failed, or the generated path didn't fit in 80 bytes.
    PhysFailed { errno: i32, path: String },
    PhysTooLong { path: String },
    /// `UI_DEV_CREATE` failed.
    CreateFailed { errno: i32 },
    /// A write to the uinput fd came back short or errored.
    WriteFailed {
        written: usize,
        expected: usize,
        errno: i32,
    },
    /// An emit/queue/flush call landed on a core that isn't in the Running state.
    NotCreated,
    /// A mouse operation was attempted on a keyboard preset, or vice versa.
    WrongKind,
    /// `type_char` was given a character outside the mapper's domain.
    UnmappableCharacter { c: char },
    /// The mouse facet has no cursor oracle available (e.g. headless).
    NoCursorOracle,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::OpenFailed { errno } => write!(
                f,
                "could not open /dev/uinput (errno {errno}); the process may need \
                 to be in the 'input' group, or the container may need explicit \
                 device passthrough for /dev/uinput"
            ),
            DeviceError::CapabilityConfigFailed { which, errno } => {
                write!(f, "{which} ioctl failed (errno {errno})")
            }
            DeviceError::SetupFailed { errno } => {
                write!(f, "UI_DEV_SETUP ioctl failed (errno {errno})")
            }
            DeviceError::PhysFailed { errno, path } => {
                write!(f, "UI_SET_PHYS ioctl failed for '{path}' (errno {errno})")
            }
            DeviceError::PhysTooLong { path } => {
                write!(f, "physical path '{path}' does not fit in 80 bytes")
            }
            DeviceError::CreateFailed { errno } => {
                write!(f, "UI_DEV_CREATE ioctl failed (errno {errno})")
            }
            DeviceError::WriteFailed {
                written,
                expected,
                errno,
            } => write!(
                f,
                "short write to uinput fd: wrote {written} of {expected} bytes (errno {errno})"
            ),
            DeviceError::NotCreated => {
                write!(f, "device core is not in the Running state")
            }
            DeviceError::WrongKind => {
                write!(f, "operation does not match the device's preset kind")
            }
            DeviceError::UnmappableCharacter { c } => {
                write!(f, "character {c:?} has no key sequence mapping")
            }
            DeviceError::NoCursorOracle => {
                write!(f, "no cursor oracle is available in this environment")
            }
        }
    }
}

impl std::error::Error for DeviceError {}

pub type Result<T> = std::result::Result<T, DeviceError>;
