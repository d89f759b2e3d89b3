//! Text measurement and line wrapping for the built-in Helvetica face.
//!
//! Widths come from the standard Helvetica AFM metrics (units of 1/1000 em),
//! so wrapping is deterministic and needs no font file or rendering engine.

use std::borrow::Cow;

/// Points to millimetres.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// Advance width used for characters outside printable ASCII.
const FALLBACK_WIDTH: u16 = 556;

/// Helvetica advance widths for `' '..='~'`.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015,                                             // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // 'N'..'Z'
    278, 278, 278, 469, 556, 333,                                                   // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // 'n'..'z'
    334, 260, 334, 584,                                                             // '{'..'~'
];

/// Non-ASCII characters the built-in fonts can encode (WinAnsiEncoding).
const WIN_ANSI_EXTRAS: &str = "\u{20ac}\u{201a}\u{192}\u{201e}\u{2026}\u{2020}\u{2021}\u{2c6}\u{2030}\u{160}\u{2039}\u{152}\u{17d}\
    \u{2018}\u{2019}\u{201c}\u{201d}\u{2022}\u{2013}\u{2014}\u{2dc}\u{2122}\u{161}\u{203a}\u{153}\u{17e}\u{178}";

fn is_win_ansi(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | ' '..='~' | '\u{a0}'..='\u{ff}') || WIN_ANSI_EXTRAS.contains(c)
}

/// Spelled-out forms for symbols common in lab reports.
fn ascii_fallback(c: char) -> Option<&'static str> {
    Some(match c {
        '\u{2265}' => ">=",
        '\u{2264}' => "<=",
        '\u{2260}' => "!=",
        '\u{2248}' => "~",
        '\u{2192}' => "->",
        '\u{2190}' => "<-",
        '\u{2191}' => "^",
        '\u{2193}' => "v",
        '\u{2212}' => "-",
        '\u{3b1}' => "alpha",
        '\u{3b2}' => "beta",
        '\u{3b3}' => "gamma",
        '\u{3b4}' => "delta",
        '\u{3ba}' => "kappa",
        '\u{3bb}' => "lambda",
        '\u{3bc}' => "\u{b5}",
        _ => return None,
    })
}

/// Rewrite `text` so every character survives WinAnsi encoding.
///
/// Known symbols get a readable substitute, other whitespace becomes a space
/// and anything else becomes `?`. Text that already encodes is borrowed.
pub fn to_win_ansi(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_win_ansi) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if is_win_ansi(c) {
            out.push(c);
        } else if let Some(sub) = ascii_fallback(c) {
            out.push_str(sub);
        } else if c.is_whitespace() {
            out.push(' ');
        } else {
            out.push('?');
        }
    }
    Cow::Owned(out)
}

fn char_units(c: char) -> u16 {
    match c {
        ' '..='~' => HELVETICA_WIDTHS[c as usize - 0x20],
        '\u{2022}' => 350,
        _ => FALLBACK_WIDTH,
    }
}

/// Rendered width of `text` in millimetres at `font_size` points.
pub fn text_width_mm(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_units(c))).sum();
    units as f32 / 1000.0 * font_size * PT_TO_MM
}

/// Split `text` into lines no wider than `max_width_mm` at `font_size`.
///
/// The text is first passed through [`to_win_ansi`], so lines are measured
/// as they will be drawn. Explicit newlines always start a new line and an
/// empty paragraph yields an empty line. Words are packed greedily; a word that cannot fit on a line
/// of its own is split between characters. Every non-whitespace character of
/// the input appears in the output, in order.
pub fn wrap_text(text: &str, max_width_mm: f32, font_size: f32) -> Vec<String> {
    let text = to_win_ansi(text);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            if text_width_mm(word, font_size) > max_width_mm {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = split_long_word(word, max_width_mm, font_size);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
                continue;
            }

            if current.is_empty() {
                current.push_str(word);
                continue;
            }

            let candidate_width = text_width_mm(&current, font_size)
                + text_width_mm(" ", font_size)
                + text_width_mm(word, font_size);
            if candidate_width <= max_width_mm {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }

        lines.push(current);
    }

    lines
}

/// Break a single word into the fewest pieces that each fit `max_width_mm`.
fn split_long_word(word: &str, max_width_mm: f32, font_size: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0;

    for c in word.chars() {
        let w = text_width_mm(c.encode_utf8(&mut [0; 4]), font_size);
        // A single glyph wider than the line still gets a line of its own.
        if !piece.is_empty() && width + w > max_width_mm {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}
