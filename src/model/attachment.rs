//! Attachments selected for persistence.
//!
//! An [`ExtractedAttachment`] borrows its payload from the parsed message
//! where it can and lives only between classification and the write to disk.

use std::borrow::Cow;

use super::message::MessageId;

/// A binary payload ready to be written, with its resolved file name.
#[derive(Debug, Clone)]
pub struct ExtractedAttachment<'a> {
    /// Message the payload was taken from.
    pub message_id: &'a MessageId,

    /// Pre-order index of the MIME part inside the message.
    pub part_index: usize,

    /// Declared or synthesized file name (a single path component).
    pub filename: String,

    /// Decoded payload bytes.
    pub payload: Cow<'a, [u8]>,
}
