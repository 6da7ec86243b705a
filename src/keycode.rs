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

//! Key code mapper.
//!
//! Maps ASCII characters to `KEY_*` codes via an explicit lookup table, not
//! the `KEY_A + (c - 'a')` arithmetic shortcut: `linux/input-event-codes.h`
//! does not lay the alphabet out in ASCII order (`KEY_A` is 30, `KEY_B` is
//! 48, `KEY_Q` is 16, ...), so that shortcut silently emits the wrong key for
//! every letter but a handful.

use crate::errors::{DeviceError, Result};

pub const KEY_ESC: u16 = 1;
pub const KEY_1: u16 = 2;
pub const KEY_2: u16 = 3;
pub const KEY_3: u16 = 4;
pub const KEY_4: u16 = 5;
pub const KEY_5: u16 = 6;
pub const KEY_6: u16 = 7;
pub const KEY_7: u16 = 8;
pub const KEY_8: u16 = 9;
pub const KEY_9: u16 = 10;
pub const KEY_0: u16 = 11;
pub const KEY_MINUS: u16 = 12;
pub const KEY_EQUAL: u16 = 13;
pub const KEY_BACKSPACE: u16 = 14;
pub const KEY_TAB: u16 = 15;
pub const KEY_Q: u16 = 16;
pub const KEY_W: u16 = 17;
pub const KEY_E: u16 = 18;
pub const KEY_R: u16 = 19;
pub const KEY_T: u16 = 20;
pub const KEY_Y: u16 = 21;
pub const KEY_U: u16 = 22;
pub const KEY_I: u16 = 23;
pub const KEY_O: u16 = 24;
pub const KEY_P: u16 = 25;
pub const KEY_LEFTBRACE: u16 = 26;
pub const KEY_RIGHTBRACE: u16 = 27;
pub const KEY_ENTER: u16 = 28;
pub const KEY_LEFTCTRL: u16 = 29;
pub const KEY_A: u16 = 30;
pub const KEY_S: u16 = 31;
pub const KEY_D: u16 = 32;
pub const KEY_F: u16 = 33;
pub const KEY_G: u16 = 34;
pub const KEY_H: u16 = 35;
pub const KEY_J: u16 = 36;
pub const KEY_K: u16 = 37;
pub const KEY_L: u16 = 38;
pub const KEY_SEMICOLON: u16 = 39;
pub const KEY_APOSTROPHE: u16 = 40;
pub const KEY_GRAVE: u16 = 41;
pub const KEY_LEFTSHIFT: u16 = 42;
pub const KEY_BACKSLASH: u16 = 43;
pub const KEY_Z: u16 = 44;
pub const KEY_X: u16 = 45;
pub const KEY_C: u16 = 46;
pub const KEY_V: u16 = 47;
pub const KEY_B: u16 = 48;
pub const KEY_N: u16 = 49;
pub const KEY_M: u16 = 50;
pub const KEY_COMMA: u16 = 51;
pub const KEY_DOT: u16 = 52;
pub const KEY_SLASH: u16 = 53;
pub const KEY_RIGHTSHIFT: u16 = 54;
pub const KEY_LEFTALT: u16 = 56;
pub const KEY_SPACE: u16 = 57;

/// A physical key, optionally chorded with shift, needed to type one
/// character. `type_char` presses/releases shift around the base key when
/// `shift` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySequence {
    pub code: u16,
    pub shift: bool,
}

/// Every key code the keyboard facet is prepared to emit, for capability
/// advertisement. Order doesn't matter to the kernel; this lists letters,
/// then digits, then punctuation/whitespace, then modifiers.
pub const ALL_KEY_CODES: &[u16] = &[
    KEY_A, KEY_B, KEY_C, KEY_D, KEY_E, KEY_F, KEY_G, KEY_H, KEY_I, KEY_J, KEY_K, KEY_L, KEY_M,
    KEY_N, KEY_O, KEY_P, KEY_Q, KEY_R, KEY_S, KEY_T, KEY_U, KEY_V, KEY_W, KEY_X, KEY_Y, KEY_Z,
    KEY_0, KEY_1, KEY_2, KEY_3, KEY_4, KEY_5, KEY_6, KEY_7, KEY_8, KEY_9,
    KEY_MINUS, KEY_EQUAL, KEY_LEFTBRACE, KEY_RIGHTBRACE, KEY_SEMICOLON, KEY_APOSTROPHE,
    KEY_GRAVE, KEY_BACKSLASH, KEY_COMMA, KEY_DOT, KEY_SLASH, KEY_SPACE, KEY_ENTER, KEY_TAB,
    KEY_BACKSPACE, KEY_ESC, KEY_LEFTSHIFT, KEY_RIGHTSHIFT, KEY_LEFTCTRL, KEY_LEFTALT,
];

/// Maps one ASCII character to the key (and shift state) needed to type it.
///
/// Returns `DeviceError::UnmappableCharacter` for anything outside the
/// printable ASCII set this table covers (no attempt is made at locale- or
/// layout-specific mapping; the device is a US QWERTY layout as far as the
/// kernel is concerned).
pub fn char_to_key(c: char) -> Result<KeySequence> {
    let (code, shift) = match c {
        'a' => (KEY_A, false),
        'b' => (KEY_B, false),
        'c' => (KEY_C, false),
        'd' => (KEY_D, false),
        'e' => (KEY_E, false),
        'f' => (KEY_F, false),
        'g' => (KEY_G, false),
        'h' => (KEY_H, false),
        'i' => (KEY_I, false),
        'j' => (KEY_J, false),
        'k' => (KEY_K, false),
        'l' => (KEY_L, false),
        'm' => (KEY_M, false),
        'n' => (KEY_N, false),
        'o' => (KEY_O, false),
        'p' => (KEY_P, false),
        'q' => (KEY_Q, false),
        'r' => (KEY_R, false),
        's' => (KEY_S, false),
        't' => (KEY_T, false),
        'u' => (KEY_U, false),
        'v' => (KEY_V, false),
        'w' => (KEY_W, false),
        'x' => (KEY_X, false),
        'y' => (KEY_Y, false),
        'z' => (KEY_Z, false),
        'A' => (KEY_A, true),
        'B' => (KEY_B, true),
        'C' => (KEY_C, true),
        'D' => (KEY_D, true),
        'E' => (KEY_E, true),
        'F' => (KEY_F, true),
        'G' => (KEY_G, true),
        'H' => (KEY_H, true),
        'I' => (KEY_I, true),
        'J' => (KEY_J, true),
        'K' => (KEY_K, true),
        'L' => (KEY_L, true),
        'M' => (KEY_M, true),
        'N' => (KEY_N, true),
        'O' => (KEY_O, true),
        'P' => (KEY_P, true),
        'Q' => (KEY_Q, true),
        'R' => (KEY_R, true),
        'S' => (KEY_S, true),
        'T' => (KEY_T, true),
        'U' => (KEY_U, true),
        'V' => (KEY_V, true),
        'W' => (KEY_W, true),
        'X' => (KEY_X, true),
        'Y' => (KEY_Y, true),
        'Z' => (KEY_Z, true),
        '0' => (KEY_0, false),
        '1' => (KEY_1, false),
        '2' => (KEY_2, false),
        '3' => (KEY_3, false),
        '4' => (KEY_4, false),
        '5' => (KEY_5, false),
        '6' => (KEY_6, false),
        '7' => (KEY_7, false),
        '8' => (KEY_8, false),
        '9' => (KEY_9, false),
        ')' => (KEY_0, true),
        '!' => (KEY_1, true),
        '@' => (KEY_2, true),
        '#' => (KEY_3, true),
        '$' => (KEY_4, true),
        '%' => (KEY_5, true),
        '^' => (KEY_6, true),
        '&' => (KEY_7, true),
        '*' => (KEY_8, true),
        '(' => (KEY_9, true),
        ' ' => (KEY_SPACE, false),
        '\n' => (KEY_ENTER, false),
        '\t' => (KEY_TAB, false),
        '-' => (KEY_MINUS, false),
        '_' => (KEY_MINUS, true),
        '=' => (KEY_EQUAL, false),
        '+' => (KEY_EQUAL, true),
        '[' => (KEY_LEFTBRACE, false),
        '{' => (KEY_LEFTBRACE, true),
        ']' => (KEY_RIGHTBRACE, false),
        '}' => (KEY_RIGHTBRACE, true),
        ';' => (KEY_SEMICOLON, false),
        ':' => (KEY_SEMICOLON, true),
        '\'' => (KEY_APOSTROPHE, false),
        '"' => (KEY_APOSTROPHE, true),
        '`' => (KEY_GRAVE, false),
        '~' => (KEY_GRAVE, true),
        '\\' => (KEY_BACKSLASH, false),
        '|' => (KEY_BACKSLASH, true),
        ',' => (KEY_COMMA, false),
        '<' => (KEY_COMMA, true),
        '.' => (KEY_DOT, false),
        '>' => (KEY_DOT, true),
        '/' => (KEY_SLASH, false),
        '?' => (KEY_SLASH, true),
        other => return Err(DeviceError::UnmappableCharacter { c: other }),
    };
    Ok(KeySequence { code, shift })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_letters_do_not_need_shift() {
        assert_eq!(
            char_to_key('q').unwrap(),
            KeySequence {
                code: KEY_Q,
                shift: false
            }
        );
    }

    #[test]
    fn arithmetic_shortcut_would_have_been_wrong_here() {
        // KEY_A + ('q' - 'a') == 30 + 16 == 46, which is KEY_C, not KEY_Q.
        let naive = KEY_A + (b'q' - b'a') as u16;
        assert_ne!(naive, KEY_Q);
        assert_eq!(char_to_key('q').unwrap().code, KEY_Q);
    }

    #[test]
    fn uppercase_requires_shift() {
        let seq = char_to_key('Z').unwrap();
        assert_eq!(seq.code, KEY_Z);
        assert!(seq.shift);
    }

    #[test]
    fn shifted_digit_symbol_resolves_to_digit_key() {
        let seq = char_to_key('!').unwrap();
        assert_eq!(seq.code, KEY_1);
        assert!(seq.shift);
    }

    #[test]
    fn unmapped_character_is_rejected() {
        let err = char_to_key('\u{1F600}').unwrap_err();
        matches!(err, DeviceError::UnmappableCharacter { c } if c == '\u{1F600}');
    }

    #[test]
    fn all_key_codes_contains_every_letter() {
        assert!(ALL_KEY_CODES.contains(&KEY_A));
        assert!(ALL_KEY_CODES.contains(&KEY_Z));
        assert!(ALL_KEY_CODES.contains(&KEY_LEFTSHIFT));
    }
}
