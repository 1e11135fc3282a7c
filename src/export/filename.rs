//! File names for extracted attachments.

use crate::model::message::MessageId;
use crate::parser::walker::LeafPart;

/// Name for a part: its declared file name, or a synthesized one.
///
/// A declared name is returned as-is; the writer refuses names that are
/// not a single path component. Anonymous parts become
/// `msg-{id}-part-{ordinal:03}.bin`.
pub fn resolve_filename(
    declared: Option<&str>,
    message_id: &MessageId,
    ordinal: usize,
) -> String {
    match declared {
        Some(name) if !is_blank(name) => name.to_string(),
        _ => format!("msg-{}-part-{ordinal:03}.bin", message_id.file_safe()),
    }
}

/// Per-message resolver that numbers anonymous parts 1, 2, 3, ...
#[derive(Debug)]
pub struct FilenameResolver<'a> {
    message_id: &'a MessageId,
    anonymous: usize,
}

impl<'a> FilenameResolver<'a> {
    pub fn new(message_id: &'a MessageId) -> Self {
        Self {
            message_id,
            anonymous: 0,
        }
    }

    /// Resolve the name for `part`, consuming an ordinal if it has none.
    pub fn resolve(&mut self, part: &LeafPart<'_>) -> String {
        self.resolve_declared(part.filename())
    }

    fn resolve_declared(&mut self, declared: Option<&str>) -> String {
        if declared.is_none_or(is_blank) {
            self.anonymous += 1;
        }
        resolve_filename(declared, self.message_id, self.anonymous)
    }
}

fn is_blank(name: &str) -> bool {
    name.trim().is_empty()
}
