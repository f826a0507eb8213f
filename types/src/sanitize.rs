//! Display sanitization for catalog text.
//!
//! Titles, bodies and Truth Layer values come from an external catalog file
//! and are drawn straight into the terminal. Escape sequences in them could
//! move the cursor, set the window title or write the clipboard, so every
//! string is filtered before it reaches a widget.

use std::borrow::Cow;

const ESC: char = '\x1b';
const BEL: char = '\x07';
const C1_CSI: char = '\u{009b}';

/// Where the filter is inside an escape sequence.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Text,
    /// Just saw ESC.
    Escape,
    /// ESC followed by a charset designator; one more char belongs to it.
    Designator,
    /// Control sequence parameters, up to a final byte.
    Csi,
    /// String sequence (OSC, DCS, PM, APC) until BEL or ST.
    Str { osc: bool },
    /// Saw ESC inside a string sequence.
    StrEscape { osc: bool },
}

/// Strip escape sequences and control characters, keeping `\n`, `\t` and `\r`.
///
/// Borrows when the input is already clean.
///
/// ```
/// use cue_types::sanitize_display_text;
///
/// assert_eq!(sanitize_display_text("Breathe"), "Breathe");
/// assert_eq!(sanitize_display_text("Breathe\x1b[2J out"), "Breathe out");
/// ```
#[must_use]
pub fn sanitize_display_text(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_unsafe) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut scan = Scan::Text;
    for c in input.chars() {
        scan = match scan {
            Scan::Text => match c {
                ESC => Scan::Escape,
                C1_CSI => Scan::Csi,
                c if is_unsafe(c) => Scan::Text,
                c => {
                    out.push(c);
                    Scan::Text
                }
            },
            Scan::Escape => match c {
                '[' => Scan::Csi,
                ']' => Scan::Str { osc: true },
                'P' | '^' | '_' | 'X' => Scan::Str { osc: false },
                '(' | ')' | '*' | '+' | '#' | ' ' => Scan::Designator,
                // Single-character commands are dropped whole.
                c if ('\x30'..='\x7e').contains(&c) => Scan::Text,
                ESC => Scan::Escape,
                c => {
                    if !is_unsafe(c) {
                        out.push(c);
                    }
                    Scan::Text
                }
            },
            Scan::Designator => Scan::Text,
            Scan::Csi => match c {
                '\x40'..='\x7e' => Scan::Text,
                '\x20'..='\x3f' => Scan::Csi,
                ESC => Scan::Escape,
                c => {
                    if !is_unsafe(c) {
                        out.push(c);
                    }
                    Scan::Text
                }
            },
            Scan::Str { osc } => match c {
                BEL if osc => Scan::Text,
                ESC => Scan::StrEscape { osc },
                _ => Scan::Str { osc },
            },
            Scan::StrEscape { osc } => match c {
                '\\' => Scan::Text,
                ESC => Scan::StrEscape { osc },
                _ => Scan::Str { osc },
            },
        };
    }
    Cow::Owned(out)
}

fn is_unsafe(c: char) -> bool {
    match c {
        '\n' | '\t' | '\r' => false,
        c => c <= '\x1f' || c == '\x7f' || ('\u{0080}'..='\u{009f}').contains(&c),
    }
}
