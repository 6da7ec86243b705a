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

#[macro_use]
extern crate log;

use clap::{App, Arg};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use uinput_hid_engine::device::LibcBackend;
use uinput_hid_engine::logging::setup_logging;
use uinput_hid_engine::mouse::NullCursorOracle;
#[cfg(target_os = "linux")]
use uinput_hid_engine::mouse::X11CursorOracle;
use uinput_hid_engine::preset::{self, PresetKind};
use uinput_hid_engine::{Keyboard, Mouse, MouseButton, RUNNING};

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

fn cursor_oracle() -> Box<dyn uinput_hid_engine::mouse::CursorOracle> {
    #[cfg(target_os = "linux")]
    {
        match X11CursorOracle::new() {
            Ok(oracle) => return Box::new(oracle),
            Err(e) => warn!("no X11 display available, falling back to null oracle: {}", e),
        }
    }
    Box::new(NullCursorOracle)
}

fn run_demo(kind: PresetKind, polling_hz: u32, profile_id: &str) {
    ctrlc::set_handler(move || {
        RUNNING.store(false, Ordering::SeqCst);
    })
    .expect("failed to install Ctrl-C handler");

    let mut rng = rand::thread_rng();

    match kind {
        PresetKind::Mouse => {
            let preset = preset::random_preset(PresetKind::Mouse, &mut rng);
            info!("Creating virtual mouse '{}'", preset.name);
            let mouse = Mouse::<LibcBackend>::new(preset, profile_id, polling_hz, cursor_oracle())
                .expect("failed to create virtual mouse");

            mouse.click(MouseButton::Left, Duration::from_millis(20)).ok();
            while RUNNING.load(Ordering::SeqCst) {
                mouse.move_by(5, 0).ok();
                thread::sleep(Duration::from_millis(16));
            }
            mouse.destroy();
        }
        PresetKind::Keyboard => {
            let preset = preset::random_preset(PresetKind::Keyboard, &mut rng);
            info!("Creating virtual keyboard '{}'", preset.name);
            let keyboard = Keyboard::<LibcBackend>::new(preset, profile_id, polling_hz)
                .expect("failed to create virtual keyboard");

            keyboard
                .type_str("hello from uinput-hid-engine\n", Duration::from_millis(20))
                .expect("failed to type demo string");

            while RUNNING.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(100));
            }
            keyboard.destroy();
        }
    }
}

fn main() {
    setup_logging();

    let matches = App::new("uinput-hid-engine")
        .version(built_info::PKG_VERSION)
        .author(built_info::PKG_AUTHORS)
        .about("Creates and drives a synthetic mouse or keyboard over /dev/uinput")
        .arg(
            Arg::with_name("device")
                .long("device")
                .value_name("KIND")
                .possible_values(&["mouse", "keyboard"])
                .default_value("mouse")
                .help("Which kind of virtual device to create"),
        )
        .arg(
            Arg::with_name("rate")
                .long("rate")
                .value_name("HZ")
                .default_value("125")
                .help("Polling rate in Hz (125, 250, 500, or 1000)"),
        )
        .arg(
            Arg::with_name("profile-id")
                .long("profile-id")
                .value_name("ID")
                .default_value("default")
                .help("Identity seed for the device's simulated USB topology"),
        )
        .get_matches();

    let kind = match matches.value_of("device").unwrap() {
        "keyboard" => PresetKind::Keyboard,
        _ => PresetKind::Mouse,
    };
    let polling_hz: u32 = matches
        .value_of("rate")
        .unwrap()
        .parse()
        .unwrap_or(125);
    let profile_id = matches.value_of("profile-id").unwrap();

    run_demo(kind, polling_hz, profile_id);
}
