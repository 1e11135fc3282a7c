//! MIME message parsing on top of `mail-parser`.

use mail_parser::{Message, MessageParser};

/// Parse a complete raw message (headers + body).
///
/// Returns `None` if the bytes do not look like a message at all.
pub fn parse_message(raw_message: &[u8]) -> Option<Message<'_>> {
    MessageParser::default().parse(skip_bom(raw_message))
}

/// Subject line for log output, or a placeholder.
pub fn subject<'a>(message: &'a Message<'_>) -> &'a str {
    message.subject().unwrap_or("(no subject)")
}

/// Drop a UTF-8 byte order mark some servers leave in front of the headers.
fn skip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}
