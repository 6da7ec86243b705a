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

//! Virtual HID engine: creates and drives synthetic mouse and keyboard
//! devices through `/dev/uinput`.

// ----- Crates -----

#[macro_use]
extern crate log;

// ----- Modules -----

pub mod abi;
pub mod capability;
pub mod device;
pub mod errors;
pub mod keyboard;
pub mod keycode;
pub mod logging;
pub mod mouse;
pub mod phys_path;
pub mod preset;

pub mod built_info {
    // This file is generated at build time using build.rs
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

// ----- Re-exports -----

pub use device::{Backend, DeviceCore, LibcBackend};
pub use errors::{DeviceError, Result};
pub use keyboard::Keyboard;
pub use mouse::{Mouse, MouseButton};
pub use preset::{Preset, PresetKind};

// ----- Functions -----

use lazy_static::lazy_static;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

lazy_static! {
    /// Flipped by the demo binary's `ctrlc` handler; checked by its main
    /// loop so a Ctrl-C lets in-flight devices tear down cleanly instead of
    /// leaving `/dev/uinput` nodes dangling.
    pub static ref RUNNING: Arc<AtomicBool> = Arc::new(AtomicBool::new(true));
}
