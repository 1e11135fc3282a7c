//! Depth-first traversal of a parsed MIME tree.
//!
//! [`PartWalker`] visits every node of a message in document order
//! (pre-order), descending into multipart bodies and embedded
//! `message/rfc822` parts. Each node is reported as a [`MessagePart`]:
//! either a container or a payload-carrying leaf. [`candidates`] narrows
//! the walk to leaves that carry a `Content-Disposition` header.

use std::borrow::Cow;

use mail_parser::decoders::base64::base64_decode;
use mail_parser::decoders::quoted_printable::quoted_printable_decode;
use mail_parser::{Encoding, Message, MessagePartId, MimeHeaders, PartType};

use crate::error::{Error, Result};
use crate::model::message::MessageId;

/// Transfer encodings whose payload `mail-parser` decodes for us.
const KNOWN_ENCODINGS: &[&str] = &[
    "7bit",
    "8bit",
    "binary",
    "base64",
    "quoted-printable",
];

/// One node of the MIME tree.
#[derive(Debug)]
pub enum MessagePart<'a> {
    /// A multipart body or an embedded message. Never carries a payload.
    Container {
        /// Pre-order index of the node.
        index: usize,
        /// Full content type, e.g. `multipart/mixed`.
        content_type: String,
    },
    /// A part with a payload of its own.
    Leaf(LeafPart<'a>),
}

impl MessagePart<'_> {
    /// Pre-order index of the node.
    pub fn index(&self) -> usize {
        match self {
            Self::Container { index, .. } => *index,
            Self::Leaf(leaf) => leaf.index,
        }
    }
}

/// A leaf MIME part.
#[derive(Debug, Clone, Copy)]
pub struct LeafPart<'a> {
    /// Pre-order index of the part within the message.
    pub index: usize,
    part: &'a mail_parser::MessagePart<'a>,
    /// Raw bytes of the message that owns the part; part offsets point here.
    raw: &'a [u8],
}

impl<'a> LeafPart<'a> {
    /// Major content type (`text`, `application`, `image`, ...).
    ///
    /// Parts without a `Content-Type` header default to `text`.
    pub fn maintype(&self) -> &'a str {
        self.part.content_type().map(|ct| ct.ctype()).unwrap_or("text")
    }

    /// Full content type, e.g. `application/pdf`.
    pub fn content_type(&self) -> String {
        match self.part.content_type() {
            Some(ct) => match ct.subtype() {
                Some(sub) => format!("{}/{}", ct.ctype(), sub),
                None => ct.ctype().to_string(),
            },
            None => "text/plain".to_string(),
        }
    }

    /// Disposition type (`attachment`, `inline`, ...) if the header is present.
    pub fn disposition(&self) -> Option<&'a str> {
        self.part.content_disposition().map(|d| d.ctype())
    }

    /// File name declared by the part, exactly as declared.
    ///
    /// Taken from the disposition `filename` parameter, falling back to the
    /// content type `name` parameter. Blank values count as undeclared.
    pub fn filename(&self) -> Option<&'a str> {
        self.part
            .attachment_name()
            .filter(|name| !name.trim().is_empty())
    }

    /// Declared `Content-Transfer-Encoding`, if any.
    pub fn transfer_encoding(&self) -> Option<&'a str> {
        self.part.content_transfer_encoding()
    }

    /// Payload with the transfer encoding undone.
    ///
    /// Fails with [`Error::Decode`] when the transfer encoding is not one we
    /// know how to undo; returning the still-encoded bytes would write a
    /// corrupt file. A body that does not decode under its declared encoding
    /// fails with [`Error::Corrupt`].
    pub fn decode(&self, message_id: &MessageId) -> Result<Cow<'a, [u8]>> {
        let declared = self.transfer_encoding().unwrap_or("7bit");
        let normalized = declared.trim().to_ascii_lowercase();
        if !KNOWN_ENCODINGS.contains(&normalized.as_str()) {
            return Err(Error::Decode {
                id: message_id.clone(),
                part: self.index,
                encoding: declared.to_string(),
            });
        }
        let corrupt = || Error::Corrupt {
            id: message_id.clone(),
            part: self.index,
            encoding: normalized.clone(),
        };
        if self.part.is_encoding_problem {
            return Err(corrupt());
        }

        match &self.part.body {
            // Text bodies are stored charset-converted; go back to the raw
            // bytes and undo only the transfer encoding.
            PartType::Text(_) | PartType::Html(_) => {
                let body = self
                    .raw
                    .get(self.part.raw_body_offset()..self.part.raw_end_offset())
                    .ok_or_else(corrupt)?;
                match self.part.encoding {
                    Encoding::None => Ok(Cow::Borrowed(body)),
                    Encoding::Base64 => base64_decode(body).map(Cow::Owned).ok_or_else(corrupt),
                    Encoding::QuotedPrintable => quoted_printable_decode(body)
                        .map(Cow::Owned)
                        .ok_or_else(corrupt),
                }
            }
            _ => Ok(Cow::Borrowed(self.part.contents())),
        }
    }
}

/// Pre-order iterator over all nodes of a message.
///
/// Restarting the walk means creating a new walker from the parsed message.
pub struct PartWalker<'a> {
    stack: Vec<(&'a Message<'a>, MessagePartId)>,
    next_index: usize,
}

impl<'a> PartWalker<'a> {
    pub fn new(message: &'a Message<'a>) -> Self {
        Self {
            stack: vec![(message, 0)],
            next_index: 0,
        }
    }
}

impl<'a> Iterator for PartWalker<'a> {
    type Item = MessagePart<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (message, id) = self.stack.pop()?;
            let Some(part) = message.parts.get(id as usize) else {
                tracing::debug!(part_id = id, "Dangling MIME part reference");
                continue;
            };

            let index = self.next_index;
            self.next_index += 1;

            let node = match &part.body {
                PartType::Multipart(children) => {
                    // Reverse so the first child is popped first.
                    for &child in children.iter().rev() {
                        self.stack.push((message, child));
                    }
                    MessagePart::Container {
                        index,
                        content_type: container_type(part, "multipart/mixed"),
                    }
                }
                PartType::Message(nested) => {
                    self.stack.push((nested, 0));
                    MessagePart::Container {
                        index,
                        content_type: container_type(part, "message/rfc822"),
                    }
                }
                _ => MessagePart::Leaf(LeafPart {
                    index,
                    part,
                    raw: message.raw_message.as_ref(),
                }),
            };
            return Some(node);
        }
    }
}

/// Walk every node of `message` in pre-order.
pub fn walk<'a>(message: &'a Message<'a>) -> PartWalker<'a> {
    PartWalker::new(message)
}

/// Leaves that declare a `Content-Disposition`, in document order.
///
/// Containers are never candidates. Leaves without a disposition are body
/// content and are skipped even if their payload is binary.
pub fn candidates<'a>(message: &'a Message<'a>) -> impl Iterator<Item = LeafPart<'a>> {
    walk(message).filter_map(|node| match node {
        MessagePart::Leaf(leaf) if leaf.disposition().is_some() => Some(leaf),
        _ => None,
    })
}

fn container_type(part: &mail_parser::MessagePart<'_>, fallback: &str) -> String {
    part.content_type()
        .map(|ct| match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub),
            None => ct.ctype().to_string(),
        })
        .unwrap_or_else(|| fallback.to_string())
}
