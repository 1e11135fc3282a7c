//! Text vs. binary classification of decoded part payloads.
//!
//! This is a best-effort heuristic. Some parts announce themselves as
//! attachments through `Content-Disposition` but carry plain text (forwarded
//! text blocks, inline signatures). Those are left out so the download
//! directory only collects real files. A binary file whose first bytes happen
//! to be printable will be misclassified as text.

/// Number of leading payload bytes that are inspected.
pub const SAMPLE_LEN: usize = 1024;

/// Lookup table of bytes that may appear in text.
///
/// BEL, BS, TAB, LF, FF, CR and ESC, plus everything from 0x20 upwards
/// except DEL.
const TEXT_BYTES: [bool; 256] = {
    let mut table = [false; 256];
    let controls = [0x07u8, 0x08, 0x09, 0x0A, 0x0C, 0x0D, 0x1B];
    let mut i = 0;
    while i < controls.len() {
        table[controls[i] as usize] = true;
        i += 1;
    }
    let mut b = 0x20;
    while b < 256 {
        table[b] = b != 0x7F;
        b += 1;
    }
    table
};

/// Returns `true` if the first [`SAMPLE_LEN`] bytes contain anything outside
/// the text byte set. Empty payloads are textual.
pub fn is_binary(payload: &[u8]) -> bool {
    payload
        .iter()
        .take(SAMPLE_LEN)
        .any(|&b| !TEXT_BYTES[b as usize])
}
