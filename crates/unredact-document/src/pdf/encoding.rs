// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-byte encodings — the base encodings a simple font can name, the
// /Differences overlay on top of them, and WinAnsiEncoding for the Helvetica
// text written to output.

use crate::pdf::glyphs;

/// Characters for codes 0x80..=0x9F. `None` marks undefined codes.
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// StandardEncoding above 0x7F; codes not listed are undefined.
const STANDARD_HIGH: &[(u8, char)] = &[
    (0xA1, '\u{00A1}'),
    (0xA2, '\u{00A2}'),
    (0xA3, '\u{00A3}'),
    (0xA4, '\u{2044}'),
    (0xA5, '\u{00A5}'),
    (0xA6, '\u{0192}'),
    (0xA7, '\u{00A7}'),
    (0xA8, '\u{00A4}'),
    (0xA9, '\''),
    (0xAA, '\u{201C}'),
    (0xAB, '\u{00AB}'),
    (0xAC, '\u{2039}'),
    (0xAD, '\u{203A}'),
    (0xAE, '\u{FB01}'),
    (0xAF, '\u{FB02}'),
    (0xB1, '\u{2013}'),
    (0xB2, '\u{2020}'),
    (0xB3, '\u{2021}'),
    (0xB4, '\u{00B7}'),
    (0xB6, '\u{00B6}'),
    (0xB7, '\u{2022}'),
    (0xB8, '\u{201A}'),
    (0xB9, '\u{201E}'),
    (0xBA, '\u{201D}'),
    (0xBB, '\u{00BB}'),
    (0xBC, '\u{2026}'),
    (0xBD, '\u{2030}'),
    (0xBF, '\u{00BF}'),
    (0xC1, '`'),
    (0xC2, '\u{00B4}'),
    (0xC3, '\u{02C6}'),
    (0xC4, '\u{02DC}'),
    (0xC5, '\u{00AF}'),
    (0xC6, '\u{02D8}'),
    (0xC7, '\u{02D9}'),
    (0xC8, '\u{00A8}'),
    (0xCA, '\u{02DA}'),
    (0xCB, '\u{00B8}'),
    (0xCD, '\u{02DD}'),
    (0xCE, '\u{02DB}'),
    (0xCF, '\u{02C7}'),
    (0xD0, '\u{2014}'),
    (0xE1, '\u{00C6}'),
    (0xE3, '\u{00AA}'),
    (0xE8, '\u{0141}'),
    (0xE9, '\u{00D8}'),
    (0xEA, '\u{0152}'),
    (0xEB, '\u{00BA}'),
    (0xF1, '\u{00E6}'),
    (0xF5, '\u{0131}'),
    (0xF8, '\u{0142}'),
    (0xF9, '\u{00F8}'),
    (0xFA, '\u{0153}'),
    (0xFB, '\u{00DF}'),
];

/// MacRomanEncoding for 0x80..=0xFF.
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è',
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü',
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø',
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø',
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{A0}', 'À', 'Ã', 'Õ', 'Œ', 'œ',
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '¤', '‹', '›', 'ﬁ', 'ﬂ',
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô',
    '\u{F8FF}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

/// Base encodings a simple font may name in /Encoding or /BaseEncoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding {
    WinAnsi,
    Standard,
    MacRoman,
}

impl BaseEncoding {
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"WinAnsiEncoding" => Some(Self::WinAnsi),
            b"StandardEncoding" => Some(Self::Standard),
            b"MacRomanEncoding" => Some(Self::MacRoman),
            _ => None,
        }
    }

    fn char_for(self, byte: u8) -> Option<char> {
        if byte < 0x20 {
            return Some(byte as char);
        }
        match self {
            Self::WinAnsi => match byte {
                0x80..=0x9F => WIN_ANSI_HIGH[(byte - 0x80) as usize],
                _ => Some(byte as char),
            },
            Self::Standard => match byte {
                0x27 => Some('\u{2019}'),
                0x60 => Some('\u{2018}'),
                0x20..=0x7E => Some(byte as char),
                _ => STANDARD_HIGH
                    .iter()
                    .find(|(code, _)| *code == byte)
                    .map(|(_, ch)| *ch),
            },
            Self::MacRoman => match byte {
                0x20..=0x7E => Some(byte as char),
                0x80..=0xFF => Some(MAC_ROMAN_HIGH[(byte - 0x80) as usize]),
                _ => None,
            },
        }
    }
}

/// Code-to-character table of a simple font: a base encoding with its
/// /Differences applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ByteEncoding {
    table: [Option<char>; 256],
}

impl ByteEncoding {
    pub fn new(base: BaseEncoding) -> Self {
        let mut table = [None; 256];
        for (code, slot) in table.iter_mut().enumerate() {
            *slot = base.char_for(code as u8);
        }
        Self { table }
    }

    /// Map `code` to the glyph called `name`. Unknown names leave the code
    /// unchanged and return false.
    pub fn set_glyph(&mut self, code: u8, name: &str) -> bool {
        match glyphs::glyph_char(name) {
            Some(ch) => {
                self.table[code as usize] = Some(ch);
                true
            }
            None => false,
        }
    }

    /// Decode one byte. Undefined codes map to U+FFFD.
    pub fn decode(&self, byte: u8) -> char {
        self.table[byte as usize].unwrap_or('\u{FFFD}')
    }

    /// Decode a byte string. A UTF-16BE byte order mark switches to UTF-16.
    pub fn decode_str(&self, bytes: &[u8]) -> String {
        match utf16_body(bytes) {
            Some(body) => decode_utf16(body),
            None => bytes.iter().map(|&byte| self.decode(byte)).collect(),
        }
    }
}

impl Default for ByteEncoding {
    fn default() -> Self {
        Self::new(BaseEncoding::WinAnsi)
    }
}

/// The bytes after a UTF-16BE byte order mark, if `bytes` starts with one.
pub fn utf16_body(bytes: &[u8]) -> Option<&[u8]> {
    bytes.strip_prefix(&[0xFE, 0xFF])
}

fn decode_utf16(body: &[u8]) -> String {
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Encode one character, if WinAnsi can represent it.
pub fn encode_char(ch: char) -> Option<u8> {
    let code = ch as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .position(|entry| *entry == Some(ch))
            .map(|index| 0x80 + index as u8),
    }
}

/// Encode a string for a WinAnsi font. Control characters become spaces and
/// anything else the encoding lacks becomes `?`.
pub fn encode_str(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| {
            if ch.is_control() {
                b' '
            } else {
                encode_char(ch).unwrap_or(b'?')
            }
        })
        .collect()
}
