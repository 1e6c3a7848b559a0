//! Caption text uses the standard Type1 Helvetica with WinAnsi encoding, so no
//! font program is embedded. Only metrics and encoding live here.

pub(crate) const CAPTION_FONT: &str = "Helvetica";

/// Map a single Unicode char to its WinAnsi (Windows-1252) byte.
fn char_to_winansi(c: char) -> Option<u8> {
    let byte = match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Encode for a `Str` operand. Unmappable chars become `?` so the caption
/// length stays recognisable.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| char_to_winansi(c).unwrap_or(b'?'))
        .collect()
}

/// Helvetica advance widths (1000 units/em) for printable ASCII 32..=126.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // '{'..'~'
];

fn helvetica_width_1000(byte: u8) -> f32 {
    match byte {
        32..=126 => f32::from(HELVETICA_ASCII[(byte - 32) as usize]),
        0x95 => 350.0,
        0x96 => 556.0,
        0x97 => 1000.0,
        0x85 | 0x89 => 1000.0,
        _ => 556.0,
    }
}

/// Rendered width of `text` in points at `font_size`.
pub(crate) fn text_width(text: &str, font_size: f32) -> f32 {
    to_winansi_bytes(text)
        .into_iter()
        .map(|b| helvetica_width_1000(b) * font_size / 1000.0)
        .sum()
}
