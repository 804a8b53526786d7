use std::sync::Arc;

use crate::types::AssetError;

use super::page::FontStyle;

const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 255;

// Advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, //
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, //
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, //
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, //
];

// WinAnsi 0x80..=0x9F; '\0' marks undefined codes.
const WIN_ANSI_HIGH: [char; 32] = [
    '€', '\0', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\0', 'Ž', '\0', //
    '\0', '‘', '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ', '\0', 'ž', 'Ÿ', //
];

/// Map a character to its WinAnsi code, `?` when it has none
pub fn win_ansi_byte(c: char) -> u8 {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => code as u8,
        0x09 | 0x0A | 0x0D => b' ',
        _ => WIN_ANSI_HIGH
            .iter()
            .position(|&mapped| mapped == c && mapped != '\0')
            .map(|idx| 0x80 + idx as u8)
            .unwrap_or(b'?'),
    }
}

pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_char(byte: u8) -> Option<char> {
    match byte {
        0x80..=0x9F => Some(WIN_ANSI_HIGH[(byte - 0x80) as usize]).filter(|c| *c != '\0'),
        0x7F => None,
        _ => Some(byte as char),
    }
}

/// Metrics needed to describe an embedded TrueType program
#[derive(Debug, Clone)]
pub struct EmbeddedProgram {
    pub data: Arc<Vec<u8>>,
    pub ascent: i16,
    pub descent: i16,
    pub cap_height: i16,
    pub italic_angle: i16,
    pub bbox: (i16, i16, i16, i16),
}

/// A font usable for measuring and drawing text.
///
/// Built-in faces are the standard Helvetica pair and need no embedding.
#[derive(Debug, Clone)]
pub struct FontFace {
    pub base_name: String,
    widths: Vec<u16>,
    pub program: Option<EmbeddedProgram>,
}

impl FontFace {
    pub fn helvetica(style: FontStyle) -> Self {
        let (name, table) = match style {
            FontStyle::Regular => ("Helvetica", &HELVETICA_WIDTHS),
            FontStyle::Bold => ("Helvetica-Bold", &HELVETICA_BOLD_WIDTHS),
        };
        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|b| match b {
                32..=126 => table[(b - 32) as usize],
                _ => 556,
            })
            .collect();
        Self {
            base_name: name.to_string(),
            widths,
            program: None,
        }
    }

    /// Parse a TrueType font for WinAnsi embedding
    pub fn from_truetype(base_name: &str, data: Arc<Vec<u8>>) -> Result<Self, AssetError> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| AssetError::Decode(format!("font parse failed: {}", e)))?;
        if face.tables().cff.is_some() {
            return Err(AssetError::Decode(
                "CFF outlines are not supported, use a TrueType font".to_string(),
            ));
        }

        let scale = 1000.0 / face.units_per_em().max(1) as f32;
        let scaled = |v: i16| (v as f32 * scale).round() as i16;

        let space_width = face
            .glyph_index(' ')
            .and_then(|id| face.glyph_hor_advance(id))
            .map(|adv| (adv as f32 * scale).round() as u16)
            .unwrap_or(250);

        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|b| {
                win_ansi_char(b)
                    .and_then(|c| face.glyph_index(c))
                    .and_then(|id| face.glyph_hor_advance(id))
                    .map(|adv| (adv as f32 * scale).round() as u16)
                    .unwrap_or(space_width)
            })
            .collect();

        let bbox = face.global_bounding_box();
        let ascent = scaled(face.ascender());
        let program = EmbeddedProgram {
            data: data.clone(),
            ascent,
            descent: scaled(face.descender()),
            cap_height: face.capital_height().map(scaled).unwrap_or(ascent),
            italic_angle: face.italic_angle().map(|a| a.round() as i16).unwrap_or(0),
            bbox: (
                scaled(bbox.x_min),
                scaled(bbox.y_min),
                scaled(bbox.x_max),
                scaled(bbox.y_max),
            ),
        };

        Ok(Self {
            base_name: sanitize_font_name(base_name),
            widths,
            program: Some(program),
        })
    }

    pub fn first_char(&self) -> u8 {
        FIRST_CHAR
    }

    pub fn last_char(&self) -> u8 {
        LAST_CHAR
    }

    pub fn widths(&self) -> &[u16] {
        &self.widths
    }

    fn byte_width(&self, byte: u8) -> u16 {
        if byte < FIRST_CHAR {
            return 0;
        }
        self.widths[(byte - FIRST_CHAR) as usize]
    }

    /// Width of `text` at `size` points
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| self.byte_width(win_ansi_byte(c)) as u32)
            .sum();
        units as f32 * size / 1000.0
    }
}

fn sanitize_font_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        cleaned
    }
}

/// Regular/bold pair used by one render
#[derive(Debug, Clone)]
pub struct FontSet {
    pub regular: FontFace,
    pub bold: FontFace,
}

impl Default for FontSet {
    fn default() -> Self {
        Self {
            regular: FontFace::helvetica(FontStyle::Regular),
            bold: FontFace::helvetica(FontStyle::Bold),
        }
    }
}

impl FontSet {
    pub fn face(&self, style: FontStyle) -> &FontFace {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
        }
    }

    pub fn text_width(&self, style: FontStyle, size: f32, text: &str) -> f32 {
        self.face(style).text_width(text, size)
    }

    /// Greedy word wrap to `max_width`. Explicit newlines start a new line;
    /// words wider than the line are split by character. Empty input yields
    /// no lines.
    pub fn wrap(&self, style: FontStyle, size: f32, text: &str, max_width: f32) -> Vec<String> {
        let face = self.face(style);
        let mut lines = Vec::new();

        for paragraph in text.lines() {
            let mut current = String::new();
            for word in paragraph.split_whitespace() {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{} {}", current, word)
                };
                if face.text_width(&candidate, size) <= max_width {
                    current = candidate;
                    continue;
                }
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                if face.text_width(word, size) <= max_width {
                    current = word.to_string();
                } else {
                    // Hard-break an overlong token
                    for c in word.chars() {
                        current.push(c);
                        if face.text_width(&current, size) > max_width && current.chars().count() > 1 {
                            current.pop();
                            lines.push(std::mem::take(&mut current));
                            current.push(c);
                        }
                    }
                }
            }
            if !current.is_empty() {
                lines.push(current);
            }
        }

        lines
    }
}
