//! Mailbox access: a "search, then fetch by identifier" abstraction.
//!
//! [`Mailbox`] is the only thing the extraction pipeline needs from a
//! server. [`imap::ImapMailbox`] implements it over IMAPS, and
//! [`memory::MemoryMailbox`] serves canned messages for tests.

pub mod imap;
pub mod memory;

use crate::error::Result;
use crate::model::message::MessageId;
use crate::search::query::SearchTerm;

/// A selected mailbox folder.
///
/// Sessions are not shareable between in-flight requests, hence `&mut self`.
pub trait Mailbox {
    /// Identifiers of messages matching all `terms`, in ascending order.
    fn search(&mut self, terms: &[SearchTerm]) -> Result<Vec<MessageId>>;

    /// The complete raw message for `id`.
    ///
    /// Fails with `Error::Fetch` when the server reports an error and
    /// `Error::EmptyMessage` when the response carries no body.
    fn fetch_raw(&mut self, id: &MessageId) -> Result<Vec<u8>>;

    /// End the session. Failures are logged, not returned.
    fn logout(&mut self);
}
