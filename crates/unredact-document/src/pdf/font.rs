// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font decoding — turns shown byte strings into Unicode text and glyph
// advances so the decomposer can place recovered spans.
//
// Decoding order: the font's /ToUnicode CMap, then (for simple fonts) the
// /Encoding with its /Differences, WinAnsi when none is named. Advances come
// from /Widths or the CID /W array.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use crate::pdf::encoding::{self, BaseEncoding, ByteEncoding};
use crate::pdf::objects::{self, get, get_dict, number, resolve};

/// Width (in 1/1000 em) used when a font carries no metrics.
const DEFAULT_GLYPH_WIDTH: f64 = 500.0;

/// Largest code range a single `bfrange` or `/W` entry may span. Wider
/// entries are malformed and skipped.
const MAX_CODE_RANGE: u32 = 0xFFFF;

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Unicode text for the code; may be empty or several characters.
    pub text: String,
    /// Horizontal advance in 1/1000 text space units.
    pub width: f64,
    /// Single-byte code 32, which receives word spacing.
    pub is_word_space: bool,
}

#[derive(Debug, Clone)]
enum Widths {
    Simple {
        first_char: u32,
        widths: Vec<f64>,
        missing: f64,
    },
    Cid {
        default: f64,
        map: HashMap<u32, f64>,
    },
}

impl Widths {
    fn width(&self, code: u32) -> f64 {
        match self {
            Self::Simple {
                first_char,
                widths,
                missing,
            } => code
                .checked_sub(*first_char)
                .and_then(|index| widths.get(index as usize))
                .copied()
                .unwrap_or(*missing),
            Self::Cid { default, map } => map.get(&code).copied().unwrap_or(*default),
        }
    }
}

/// Decoder for one font resource.
#[derive(Debug, Clone)]
pub struct FontDecoder {
    to_unicode: Option<CMap>,
    encoding: ByteEncoding,
    /// Type0 fonts use two-byte codes.
    two_byte: bool,
    widths: Widths,
}

impl Default for FontDecoder {
    fn default() -> Self {
        Self {
            to_unicode: None,
            encoding: ByteEncoding::default(),
            two_byte: false,
            widths: Widths::Simple {
                first_char: 0,
                widths: Vec::new(),
                missing: DEFAULT_GLYPH_WIDTH,
            },
        }
    }
}

impl FontDecoder {
    /// Build a decoder from a font dictionary.
    pub fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let two_byte = get(doc, font, b"Subtype").and_then(objects::name) == Some(b"Type0");

        let to_unicode = match get(doc, font, b"ToUnicode") {
            Some(Object::Stream(stream)) => match objects::stream_data(doc, stream) {
                Ok(data) => Some(CMap::parse(&data)),
                Err(err) => {
                    debug!(%err, "unreadable ToUnicode CMap, falling back to WinAnsi");
                    None
                }
            },
            _ => None,
        };

        let (widths, encoding) = if two_byte {
            (cid_widths(doc, font), ByteEncoding::default())
        } else {
            (simple_widths(doc, font), simple_encoding(doc, font))
        };

        Self {
            to_unicode,
            encoding,
            two_byte,
            widths,
        }
    }

    fn code_length(&self) -> usize {
        match &self.to_unicode {
            Some(cmap) if cmap.code_bytes > 0 => cmap.code_bytes,
            _ if self.two_byte => 2,
            _ => 1,
        }
    }

    /// Split a shown string into glyphs.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        if self.to_unicode.is_none() && !self.two_byte {
            if encoding::utf16_body(bytes).is_some() {
                return self
                    .encoding
                    .decode_str(bytes)
                    .chars()
                    .map(|ch| Glyph {
                        text: ch.to_string(),
                        width: DEFAULT_GLYPH_WIDTH,
                        is_word_space: ch == ' ',
                    })
                    .collect();
            }
            return bytes
                .iter()
                .map(|&byte| Glyph {
                    text: self.encoding.decode(byte).to_string(),
                    width: self.widths.width(byte as u32),
                    is_word_space: byte == b' ',
                })
                .collect();
        }

        let step = self.code_length();
        bytes
            .chunks(step)
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, &byte| (acc << 8) | byte as u32);
                let text = match &self.to_unicode {
                    Some(cmap) => cmap.lookup(code).map(str::to_owned).unwrap_or_else(|| {
                        if step == 1 {
                            self.encoding.decode(code as u8).to_string()
                        } else {
                            String::new()
                        }
                    }),
                    None => char::from_u32(code).map(String::from).unwrap_or_default(),
                };
                Glyph {
                    text,
                    width: self.widths.width(code),
                    is_word_space: step == 1 && code == 32,
                }
            })
            .collect()
    }
}

fn simple_widths(doc: &Document, font: &Dictionary) -> Widths {
    let first_char = get(doc, font, b"FirstChar")
        .and_then(number)
        .map(|value| value.max(0.0) as u32)
        .unwrap_or(0);
    let widths = match get(doc, font, b"Widths") {
        Some(Object::Array(items)) => items
            .iter()
            .map(|item| resolve(doc, item).and_then(number).unwrap_or(0.0))
            .collect(),
        _ => Vec::new(),
    };
    let missing = get_dict(doc, font, b"FontDescriptor")
        .and_then(|descriptor| get(doc, descriptor, b"MissingWidth"))
        .and_then(number)
        .filter(|width| *width > 0.0)
        .unwrap_or(DEFAULT_GLYPH_WIDTH);
    Widths::Simple {
        first_char,
        widths,
        missing,
    }
}

/// The code table of a simple font. A named encoding replaces WinAnsi; an
/// encoding dictionary starts from its /BaseEncoding (StandardEncoding when
/// absent) and applies /Differences.
fn simple_encoding(doc: &Document, font: &Dictionary) -> ByteEncoding {
    let dict = match get(doc, font, b"Encoding") {
        Some(Object::Name(name)) => {
            let base = BaseEncoding::from_name(name).unwrap_or(BaseEncoding::WinAnsi);
            return ByteEncoding::new(base);
        }
        Some(Object::Dictionary(dict)) => dict,
        _ => return ByteEncoding::default(),
    };

    let base = get(doc, dict, b"BaseEncoding")
        .and_then(objects::name)
        .and_then(BaseEncoding::from_name)
        .unwrap_or(BaseEncoding::Standard);
    let mut encoding = ByteEncoding::new(base);

    if let Some(Object::Array(items)) = get(doc, dict, b"Differences") {
        let mut code: Option<i64> = None;
        for item in items.iter().filter_map(|item| resolve(doc, item)) {
            match item {
                Object::Integer(start) => code = Some(*start),
                Object::Name(glyph) => {
                    if let Some(current) = code {
                        let name = String::from_utf8_lossy(glyph);
                        match u8::try_from(current) {
                            Ok(byte) => {
                                if !encoding.set_glyph(byte, &name) {
                                    debug!(code = current, glyph = %name, "unknown glyph name");
                                }
                            }
                            Err(_) => debug!(code = current, "/Differences code out of range"),
                        }
                        code = current.checked_add(1);
                    }
                }
                _ => {}
            }
        }
    }
    encoding
}

fn cid_widths(doc: &Document, font: &Dictionary) -> Widths {
    let descendant = match get(doc, font, b"DescendantFonts") {
        Some(Object::Array(items)) => items.first().and_then(|item| match resolve(doc, item) {
            Some(Object::Dictionary(dict)) => Some(dict),
            _ => None,
        }),
        _ => None,
    };
    let Some(descendant) = descendant else {
        return Widths::Cid {
            default: 1000.0,
            map: HashMap::new(),
        };
    };

    let default = get(doc, descendant, b"DW").and_then(number).unwrap_or(1000.0);
    let mut map = HashMap::new();
    if let Some(Object::Array(items)) = get(doc, descendant, b"W") {
        let items: Vec<&Object> = items.iter().filter_map(|item| resolve(doc, item)).collect();
        let mut index = 0;
        while index < items.len() {
            let Some(first) = number(items[index]) else {
                break;
            };
            let first = first as u32;
            match items.get(index + 1) {
                // `c [w1 w2 ...]`
                Some(Object::Array(run)) => {
                    let run = run.iter().take(MAX_CODE_RANGE as usize + 1);
                    for (offset, width) in run.enumerate() {
                        let Some(code) = u32::try_from(offset)
                            .ok()
                            .and_then(|offset| first.checked_add(offset))
                        else {
                            break;
                        };
                        if let Some(width) = resolve(doc, width).and_then(number) {
                            map.insert(code, width);
                        }
                    }
                    index += 2;
                }
                // `c_first c_last w`
                Some(last) => {
                    let (Some(last), Some(width)) =
                        (number(last), items.get(index + 2).and_then(|w| number(w)))
                    else {
                        break;
                    };
                    let last = last as u32;
                    if last >= first && last - first <= MAX_CODE_RANGE {
                        for code in first..=last {
                            map.insert(code, width);
                        }
                    } else {
                        debug!(first, last, "skipping malformed /W range");
                    }
                    index += 3;
                }
                None => break,
            }
        }
    }
    Widths::Cid { default, map }
}

// -- ToUnicode CMaps ----------------------------------------------------------

/// Code-to-Unicode mapping parsed from a /ToUnicode stream.
#[derive(Debug, Clone, Default)]
pub struct CMap {
    map: HashMap<u32, String>,
    /// Code length in bytes taken from the first codespace range; 0 when
    /// the CMap declares none.
    code_bytes: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

impl CMap {
    /// Parse the `bfchar`, `bfrange`, and `codespacerange` sections of a
    /// CMap program. Unknown constructs are ignored.
    pub fn parse(data: &[u8]) -> Self {
        let tokens = tokenize(data);
        let mut cmap = CMap::default();
        let mut index = 0;

        while index < tokens.len() {
            match &tokens[index] {
                Token::Word(word) if word == "begincodespacerange" => {
                    if let Some(Token::Hex(low)) = tokens.get(index + 1) {
                        if cmap.code_bytes == 0 {
                            cmap.code_bytes = low.len();
                        }
                    }
                    index += 1;
                }
                Token::Word(word) if word == "beginbfchar" => {
                    index += 1;
                    while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                        (tokens.get(index), tokens.get(index + 1))
                    {
                        cmap.map.insert(code_of(src), utf16_text(dst));
                        index += 2;
                    }
                }
                Token::Word(word) if word == "beginbfrange" => {
                    index += 1;
                    while let (Some(Token::Hex(low)), Some(Token::Hex(high))) =
                        (tokens.get(index), tokens.get(index + 1))
                    {
                        let (low, high) = (code_of(low), code_of(high));
                        let valid = high >= low && high - low <= MAX_CODE_RANGE;
                        if !valid {
                            debug!(low, high, "skipping malformed bfrange");
                        }
                        match tokens.get(index + 2) {
                            Some(Token::Hex(dst)) => {
                                if valid {
                                    for (offset, code) in (low..=high).enumerate() {
                                        cmap.map.insert(code, offset_text(dst, offset as u32));
                                    }
                                }
                                index += 3;
                            }
                            Some(Token::ArrayStart) => {
                                let mut cursor = index + 3;
                                let mut code = Some(low).filter(|_| valid);
                                while let Some(Token::Hex(dst)) = tokens.get(cursor) {
                                    if let Some(current) = code.filter(|current| *current <= high) {
                                        cmap.map.insert(current, utf16_text(dst));
                                        code = current.checked_add(1);
                                    }
                                    cursor += 1;
                                }
                                // Skip the closing bracket.
                                index = cursor + 1;
                            }
                            _ => break,
                        }
                    }
                }
                _ => index += 1,
            }
        }
        cmap
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &byte| (acc << 8) | byte as u32)
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| match pair {
            [high, low] => u16::from_be_bytes([*high, *low]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Destination text for the `offset`-th code of a `bfrange`: the last UTF-16
/// unit is incremented.
fn offset_text(dst: &[u8], offset: u32) -> String {
    let mut units: Vec<u16> = dst
        .chunks(2)
        .map(|pair| match pair {
            [high, low] => u16::from_be_bytes([*high, *low]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect();
    if let Some(last) = units.last_mut() {
        *last = last.wrapping_add(offset as u16);
    }
    String::from_utf16_lossy(&units)
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut index = 0;
    while index < data.len() {
        let byte = data[index];
        match byte {
            b'%' => {
                while index < data.len() && data[index] != b'\n' && data[index] != b'\r' {
                    index += 1;
                }
            }
            b'<' if data.get(index + 1) == Some(&b'<') => index += 2,
            b'>' if data.get(index + 1) == Some(&b'>') => index += 2,
            b'<' => {
                let start = index + 1;
                let end = data[start..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map(|offset| start + offset)
                    .unwrap_or(data.len());
                tokens.push(Token::Hex(parse_hex(&data[start..end])));
                index = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                index += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                index += 1;
            }
            b'(' => {
                // Literal strings carry no mapping data; skip them.
                let mut depth = 0usize;
                while index < data.len() {
                    match data[index] {
                        b'\\' => index += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    index += 1;
                }
                index += 1;
            }
            _ if byte.is_ascii_whitespace() => index += 1,
            _ => {
                let start = index;
                while index < data.len()
                    && !data[index].is_ascii_whitespace()
                    && !matches!(data[index], b'<' | b'>' | b'[' | b']' | b'(' | b'%' | b'/')
                {
                    index += 1;
                }
                if index == start {
                    // A lone '/' starts a name; consume it with the name body.
                    index += 1;
                    while index < data.len()
                        && !data[index].is_ascii_whitespace()
                        && !matches!(data[index], b'<' | b'>' | b'[' | b']' | b'(' | b'%' | b'/')
                    {
                        index += 1;
                    }
                }
                tokens.push(Token::Word(
                    String::from_utf8_lossy(&data[start..index]).into_owned(),
                ));
            }
        }
    }
    tokens
}

fn parse_hex(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&b| (b as char).to_digit(16).map(|d| d as u8))
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| match pair {
            [high, low] => (high << 4) | low,
            [high] => high << 4,
            _ => 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    const IDENTITY_CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <004A>
endbfchar
2 beginbfrange
<0020> <0022> <0061>
<0030> <0031> [<0044> <006F>]
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

    #[test]
    fn cmap_reads_chars_and_ranges() {
        let cmap = CMap::parse(IDENTITY_CMAP);
        assert_eq!(cmap.code_bytes, 2);
        assert_eq!(cmap.lookup(0x0011), Some("J"));
        assert_eq!(cmap.lookup(0x0003), Some(" "));
        assert_eq!(cmap.lookup(0x0020), Some("a"));
        assert_eq!(cmap.lookup(0x0022), Some("c"));
        assert_eq!(cmap.lookup(0x0030), Some("D"));
        assert_eq!(cmap.lookup(0x0031), Some("o"));
        assert_eq!(cmap.len(), 7);
    }

    #[test]
    fn type0_font_decodes_through_cmap() {
        let mut doc = Document::with_version("1.5");
        let cmap_id = doc.add_object(Stream::new(Dictionary::new(), IDENTITY_CMAP.to_vec()));
        let descendant = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "DW" => 600,
            "W" => vec![Object::Integer(17), Object::Array(vec![Object::Integer(250)])],
        });
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "Arial",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant)],
            "ToUnicode" => Object::Reference(cmap_id),
        };

        let decoder = FontDecoder::from_dict(&doc, &font);
        let glyphs = decoder.decode(&[0x00, 0x11, 0x00, 0x20, 0x00, 0x03]);
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "Ja ");
        assert_eq!(glyphs[0].width, 250.0);
        assert_eq!(glyphs[1].width, 600.0);
        assert!(!glyphs[2].is_word_space);
    }

    #[test]
    fn simple_font_uses_widths_array() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "FirstChar" => 32,
            "Widths" => vec![Object::Integer(278), Object::Integer(333)],
        };
        let decoder = FontDecoder::from_dict(&doc, &font);
        let glyphs = decoder.decode(b" !A");
        assert_eq!(glyphs[0].width, 278.0);
        assert!(glyphs[0].is_word_space);
        assert_eq!(glyphs[1].width, 333.0);
        assert_eq!(glyphs[2].width, DEFAULT_GLYPH_WIDTH);
        assert_eq!(glyphs[2].text, "A");
    }

    #[test]
    fn differences_remap_simple_font_codes() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "ABCDEF+Garamond",
            "Encoding" => dictionary! {
                "Type" => "Encoding",
                "Differences" => vec![
                    Object::Integer(1),
                    Object::Name(b"J".to_vec()),
                    Object::Name(b"a".to_vec()),
                    Object::Integer(300),
                    Object::Name(b"b".to_vec()),
                ],
            },
        };
        let decoder = FontDecoder::from_dict(&doc, &font);
        let glyphs = decoder.decode(&[1, 2, b'n', b'e']);
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "Jane");
    }

    #[test]
    fn named_mac_roman_encoding() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "Encoding" => "MacRomanEncoding",
        };
        let glyphs = FontDecoder::from_dict(&doc, &font).decode(b"M\x9Fller");
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "Müller");
    }

    #[test]
    fn utf16_string_in_simple_font() {
        let glyphs = FontDecoder::default().decode(b"\xFE\xFF\x00J\x00 \x00D");
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "J D");
        assert!(glyphs[1].is_word_space);
    }

    #[test]
    fn oversized_bfrange_is_skipped() {
        let cmap = CMap::parse(
            b"2 beginbfrange <00000000> <03FFFFFF> <0041> <0010> <0012> <0061> endbfrange",
        );
        assert_eq!(cmap.len(), 3);
        assert_eq!(cmap.lookup(0x0011), Some("b"));
        assert_eq!(cmap.lookup(0), None);
    }

    #[test]
    fn reversed_bfrange_array_is_skipped() {
        let cmap = CMap::parse(b"1 beginbfrange <0005> <0001> [<0041> <0042>] endbfrange");
        assert!(cmap.is_empty());
    }

    #[test]
    fn malformed_width_runs_do_not_overflow() {
        let mut doc = Document::with_version("1.5");
        let descendant = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "W" => vec![
                Object::Integer(4_294_967_295),
                Object::Array(vec![Object::Integer(500), Object::Integer(500)]),
                Object::Integer(0),
                Object::Integer(4_000_000_000),
                Object::Integer(700),
                Object::Integer(10),
                Object::Integer(11),
                Object::Integer(250),
            ],
        });
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "DescendantFonts" => vec![Object::Reference(descendant)],
        };
        let decoder = FontDecoder::from_dict(&doc, &font);
        let glyphs = decoder.decode(&[0x00, 0x0A, 0x00, 0x05]);
        assert_eq!(glyphs[0].width, 250.0);
        assert_eq!(glyphs[1].width, 1000.0);
    }

    #[test]
    fn default_decoder_is_win_ansi() {
        let glyphs = FontDecoder::default().decode(&[0x93, b'x', 0x94]);
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "\u{201C}x\u{201D}");
    }
}
