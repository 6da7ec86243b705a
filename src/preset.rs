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

//! Preset registry.
//!
//! A preset bundles the identity (`InputId` + display name), capability
//! record, and supported polling rates a device presents to the kernel, so
//! callers pick "a mouse" or "a keyboard" rather than hand-assembling
//! vendor/product pairs themselves. Presets are grouped into brands so a
//! mouse and keyboard can be drawn as a matching pair.

use crate::abi::{self, InputId};
use crate::capability::{CapabilityRecord, FormFactor, KeyboardCapabilities, MouseCapabilities};
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    Mouse,
    Keyboard,
}

#[derive(Clone, Copy)]
pub struct Preset {
    pub kind: PresetKind,
    pub name: &'static str,
    pub brand: &'static str,
    pub vendor: u16,
    pub product: u16,
    pub bus: u16,
    pub capabilities: CapabilityRecord,
    pub supported_polling_hz: &'static [u32],
    pub default_polling_hz: u32,
}

impl Preset {
    pub fn input_id(&self) -> InputId {
        InputId {
            bustype: self.bus,
            vendor: self.vendor,
            product: self.product,
            version: 1,
        }
    }
}

/// A handful of plausible, publicly-known vendor/product pairs, grouped by
/// brand so a mouse and keyboard can be drawn as a matching set. These are
/// not tied to any specific real device's full HID descriptor, only its
/// identity fields and polling-rate options, which is all `UI_DEV_SETUP`
/// and the capability ioctls expose.
/// Button/axis/scancode fields shared by every mouse preset below; only
/// `dpi_stages` varies per model.
const MOUSE_CAPS: MouseCapabilities = MouseCapabilities {
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
};

/// Key set and feature flags shared by every keyboard preset below unless
/// overridden.
const KEYBOARD_CAPS: KeyboardCapabilities = KeyboardCapabilities {
    keys: crate::keycode::ALL_KEY_CODES,
    scancode: true,
    form_factor: FormFactor::Full,
    numpad: true,
    media_keys: false,
    macro_keys: false,
    macro_key_count: 0,
    leds: false,
    key_repeat: true,
};

pub const MOUSE_PRESETS: &[Preset] = &[
    Preset {
        kind: PresetKind::Mouse,
        name: "Logitech G502 HERO Gaming Mouse",
        brand: "Logitech",
        vendor: 0x046d,
        product: 0xc08b,
        bus: abi::BUS_USB,
        capabilities: CapabilityRecord::Mouse(MOUSE_CAPS),
        supported_polling_hz: &[125, 250, 500, 1000],
        default_polling_hz: 1000,
    },
    Preset {
        kind: PresetKind::Mouse,
        name: "Razer DeathAdder V2",
        brand: "Razer",
        vendor: 0x1532,
        product: 0x0084,
        bus: abi::BUS_USB,
        capabilities: CapabilityRecord::Mouse(MouseCapabilities {
            dpi_stages: 4,
            ..MOUSE_CAPS
        }),
        supported_polling_hz: &[125, 500, 1000],
        default_polling_hz: 1000,
    },
    Preset {
        kind: PresetKind::Mouse,
        name: "Generic USB Optical Mouse",
        brand: "Generic",
        vendor: 0x0458,
        product: 0x0001,
        bus: abi::BUS_USB,
        capabilities: CapabilityRecord::Mouse(MouseCapabilities {
            dpi_stages: 1,
            ..MOUSE_CAPS
        }),
        supported_polling_hz: &[125],
        default_polling_hz: 125,
    },
];

pub const KEYBOARD_PRESETS: &[Preset] = &[
    Preset {
        kind: PresetKind::Keyboard,
        name: "Logitech G915 Wireless Keyboard",
        brand: "Logitech",
        vendor: 0x046d,
        product: 0x408e,
        bus: abi::BUS_USB,
        // Marketed as a TKL board: no numpad, but a full media row.
        capabilities: CapabilityRecord::Keyboard(KeyboardCapabilities {
            form_factor: FormFactor::Tkl,
            numpad: false,
            media_keys: true,
            ..KEYBOARD_CAPS
        }),
        supported_polling_hz: &[125, 250, 500, 1000],
        default_polling_hz: 1000,
    },
    Preset {
        kind: PresetKind::Keyboard,
        name: "Razer BlackWidow V3",
        brand: "Razer",
        vendor: 0x1532,
        product: 0x025d,
        bus: abi::BUS_USB,
        capabilities: CapabilityRecord::Keyboard(KeyboardCapabilities {
            media_keys: true,
            macro_keys: true,
            macro_key_count: 5,
            leds: true,
            ..KEYBOARD_CAPS
        }),
        supported_polling_hz: &[125, 500, 1000],
        default_polling_hz: 1000,
    },
    Preset {
        kind: PresetKind::Keyboard,
        name: "Generic USB Keyboard",
        brand: "Generic",
        vendor: 0x0458,
        product: 0x0002,
        bus: abi::BUS_USB,
        capabilities: CapabilityRecord::Keyboard(KEYBOARD_CAPS),
        supported_polling_hz: &[125],
        default_polling_hz: 125,
    },
];

pub fn presets_for(kind: PresetKind) -> &'static [Preset] {
    match kind {
        PresetKind::Mouse => MOUSE_PRESETS,
        PresetKind::Keyboard => KEYBOARD_PRESETS,
    }
}

/// Case-insensitive lookup by display name.
pub fn by_name(name: &str) -> Option<&'static Preset> {
    MOUSE_PRESETS
        .iter()
        .chain(KEYBOARD_PRESETS.iter())
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Pick a preset of the given kind uniformly at random from `rng`.
pub fn random_preset(kind: PresetKind, rng: &mut impl Rng) -> &'static Preset {
    presets_for(kind)
        .choose(rng)
        .expect("preset table for each kind is non-empty")
}

pub fn random_mouse(rng: &mut impl Rng) -> &'static Preset {
    random_preset(PresetKind::Mouse, rng)
}

pub fn random_keyboard(rng: &mut impl Rng) -> &'static Preset {
    random_preset(PresetKind::Keyboard, rng)
}

/// Draw a mouse and keyboard pair from `rng`. With probability 0.70 both
/// come from the same brand group; otherwise each is drawn independently.
pub fn random_matching_pair(rng: &mut impl Rng) -> (&'static Preset, &'static Preset) {
    if rng.gen_bool(0.70) {
        let brands: Vec<&'static str> = MOUSE_PRESETS
            .iter()
            .filter(|m| KEYBOARD_PRESETS.iter().any(|k| k.brand == m.brand))
            .map(|m| m.brand)
            .collect();
        if let Some(&brand) = brands.choose(rng) {
            let mouse = MOUSE_PRESETS
                .iter()
                .filter(|m| m.brand == brand)
                .collect::<Vec<_>>()
                .choose(rng)
                .copied()
                .expect("brand group has at least one mouse");
            let keyboard = KEYBOARD_PRESETS
                .iter()
                .filter(|k| k.brand == brand)
                .collect::<Vec<_>>()
                .choose(rng)
                .copied()
                .expect("brand group has at least one keyboard");
            return (mouse, keyboard);
        }
    }
    (random_mouse(rng), random_keyboard(rng))
}

/// With probability 0.70 (or always, if the preset only supports one rate)
/// return the preset's default polling rate; otherwise a rate chosen
/// uniformly from the remaining supported rates, using `rng`.
pub fn select_polling_rate(preset: &Preset, rng: &mut impl Rng) -> u32 {
    let others: Vec<u32> = preset
        .supported_polling_hz
        .iter()
        .copied()
        .filter(|&hz| hz != preset.default_polling_hz)
        .collect();
    if others.is_empty() {
        return preset.default_polling_hz;
    }
    if rng.gen_bool(0.70) {
        preset.default_polling_hz
    } else {
        *others
            .choose(rng)
            .expect("non-default rates is non-empty here")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    /// A fixed, non-thread-rng source so these tests exercise the same draw
    /// sequence on every run instead of depending on `thread_rng()`'s
    /// process-global state.
    fn test_rng() -> StepRng {
        StepRng::new(0x5EED, 0x9E37_79B9)
    }

    #[test]
    fn random_preset_matches_requested_kind() {
        let mut rng = test_rng();
        for _ in 0..20 {
            let preset = random_preset(PresetKind::Mouse, &mut rng);
            assert_eq!(preset.kind, PresetKind::Mouse);
            let preset = random_preset(PresetKind::Keyboard, &mut rng);
            assert_eq!(preset.kind, PresetKind::Keyboard);
        }
    }

    #[test]
    fn select_polling_rate_is_always_supported() {
        let mut rng = test_rng();
        for preset in MOUSE_PRESETS.iter().chain(KEYBOARD_PRESETS.iter()) {
            for _ in 0..20 {
                let hz = select_polling_rate(preset, &mut rng);
                assert!(preset.supported_polling_hz.contains(&hz));
            }
        }
    }

    #[test]
    fn single_rate_preset_always_returns_that_rate() {
        let generic = by_name("Generic USB Optical Mouse").unwrap();
        assert_eq!(generic.supported_polling_hz, &[125]);
        let mut rng = test_rng();
        for _ in 0..10 {
            assert_eq!(select_polling_rate(generic, &mut rng), 125);
        }
    }

    #[test]
    fn by_name_is_case_insensitive() {
        let preset = by_name("logitech g502 hero gaming mouse").unwrap();
        assert_eq!(preset.name, "Logitech G502 HERO Gaming Mouse");
        assert!(by_name("does not exist").is_none());
    }

    #[test]
    fn matching_pair_has_one_mouse_and_one_keyboard() {
        let mut rng = test_rng();
        for _ in 0..20 {
            let (mouse, keyboard) = random_matching_pair(&mut rng);
            assert_eq!(mouse.kind, PresetKind::Mouse);
            assert_eq!(keyboard.kind, PresetKind::Keyboard);
        }
    }

    #[test]
    fn mouse_presets_carry_mouse_capabilities() {
        for preset in MOUSE_PRESETS {
            assert!(!preset.capabilities.rel().is_empty());
        }
    }

    #[test]
    fn keyboard_presets_carry_no_relative_axes() {
        for preset in KEYBOARD_PRESETS {
            assert!(preset.capabilities.rel().is_empty());
        }
    }
}
