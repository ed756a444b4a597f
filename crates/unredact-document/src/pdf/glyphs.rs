// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph names — maps the PostScript glyph names used by /Differences arrays
// to Unicode. Covers the Latin text glyphs plus the `uniXXXX` and `uXXXX[XX]`
// naming conventions.

/// Names for 0x20..=0x7E, in code order.
const ASCII_NAMES: [&str; 95] = [
    "space", "exclam", "quotedbl", "numbersign", "dollar", "percent", "ampersand",
    "quotesingle", "parenleft", "parenright", "asterisk", "plus", "comma", "hyphen",
    "period", "slash", "zero", "one", "two", "three", "four", "five", "six", "seven",
    "eight", "nine", "colon", "semicolon", "less", "equal", "greater", "question", "at",
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
    "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "bracketleft", "backslash",
    "bracketright", "asciicircum", "underscore", "grave", "a", "b", "c", "d", "e", "f",
    "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u", "v", "w",
    "x", "y", "z", "braceleft", "bar", "braceright", "asciitilde",
];

/// Names for U+00A0..=U+00FF, in code point order.
const LATIN1_NAMES: [&str; 96] = [
    "nbspace", "exclamdown", "cent", "sterling", "currency", "yen", "brokenbar",
    "section", "dieresis", "copyright", "ordfeminine", "guillemotleft", "logicalnot",
    "sfthyphen", "registered", "macron", "degree", "plusminus", "twosuperior",
    "threesuperior", "acute", "mu", "paragraph", "periodcentered", "cedilla",
    "onesuperior", "ordmasculine", "guillemotright", "onequarter", "onehalf",
    "threequarters", "questiondown", "Agrave", "Aacute", "Acircumflex", "Atilde",
    "Adieresis", "Aring", "AE", "Ccedilla", "Egrave", "Eacute", "Ecircumflex",
    "Edieresis", "Igrave", "Iacute", "Icircumflex", "Idieresis", "Eth", "Ntilde",
    "Ograve", "Oacute", "Ocircumflex", "Otilde", "Odieresis", "multiply", "Oslash",
    "Ugrave", "Uacute", "Ucircumflex", "Udieresis", "Yacute", "Thorn", "germandbls",
    "agrave", "aacute", "acircumflex", "atilde", "adieresis", "aring", "ae", "ccedilla",
    "egrave", "eacute", "ecircumflex", "edieresis", "igrave", "iacute", "icircumflex",
    "idieresis", "eth", "ntilde", "ograve", "oacute", "ocircumflex", "otilde",
    "odieresis", "divide", "oslash", "ugrave", "uacute", "ucircumflex", "udieresis",
    "yacute", "thorn", "ydieresis",
];

/// Everything else a Latin text font commonly names.
const OTHER_NAMES: &[(&str, char)] = &[
    ("quoteleft", '\u{2018}'),
    ("quoteright", '\u{2019}'),
    ("quotesinglbase", '\u{201A}'),
    ("quotedblleft", '\u{201C}'),
    ("quotedblright", '\u{201D}'),
    ("quotedblbase", '\u{201E}'),
    ("guilsinglleft", '\u{2039}'),
    ("guilsinglright", '\u{203A}'),
    ("endash", '\u{2013}'),
    ("emdash", '\u{2014}'),
    ("bullet", '\u{2022}'),
    ("ellipsis", '\u{2026}'),
    ("dagger", '\u{2020}'),
    ("daggerdbl", '\u{2021}'),
    ("perthousand", '\u{2030}'),
    ("trademark", '\u{2122}'),
    ("Euro", '\u{20AC}'),
    ("florin", '\u{0192}'),
    ("fraction", '\u{2044}'),
    ("minus", '\u{2212}'),
    ("dotlessi", '\u{0131}'),
    ("Lslash", '\u{0141}'),
    ("lslash", '\u{0142}'),
    ("OE", '\u{0152}'),
    ("oe", '\u{0153}'),
    ("Scaron", '\u{0160}'),
    ("scaron", '\u{0161}'),
    ("Ydieresis", '\u{0178}'),
    ("Zcaron", '\u{017D}'),
    ("zcaron", '\u{017E}'),
    ("circumflex", '\u{02C6}'),
    ("caron", '\u{02C7}'),
    ("breve", '\u{02D8}'),
    ("dotaccent", '\u{02D9}'),
    ("ring", '\u{02DA}'),
    ("ogonek", '\u{02DB}'),
    ("tilde", '\u{02DC}'),
    ("hungarumlaut", '\u{02DD}'),
    ("fi", '\u{FB01}'),
    ("fl", '\u{FB02}'),
    ("ff", '\u{FB00}'),
    ("ffi", '\u{FB03}'),
    ("ffl", '\u{FB04}'),
    // Aliases seen in older fonts.
    ("nonbreakingspace", '\u{00A0}'),
    ("softhyphen", '\u{00AD}'),
    ("middot", '\u{00B7}'),
    ("Dcroat", '\u{0110}'),
];

/// Unicode character for a glyph name, if known.
pub fn glyph_char(name: &str) -> Option<char> {
    // Suffixed variants such as `a.sc` or `one.oldstyle` share the base glyph.
    let base = name.split('.').next().unwrap_or(name);

    if let Some(index) = ASCII_NAMES.iter().position(|known| *known == base) {
        return char::from_u32(0x20 + index as u32);
    }
    if let Some(index) = LATIN1_NAMES.iter().position(|known| *known == base) {
        return char::from_u32(0xA0 + index as u32);
    }
    if let Some((_, ch)) = OTHER_NAMES.iter().find(|(known, _)| *known == base) {
        return Some(*ch);
    }

    let hex = if let Some(digits) = base.strip_prefix("uni") {
        Some(digits).filter(|digits| digits.len() == 4)
    } else {
        base.strip_prefix('u')
            .filter(|digits| (4..=6).contains(&digits.len()))
    }?;
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}
