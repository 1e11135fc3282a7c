//! In-memory [`Mailbox`] for tests and dry runs against saved messages.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::model::message::MessageId;
use crate::search::query::SearchTerm;

use super::Mailbox;

/// Canned messages keyed by identifier.
///
/// `search` ignores the terms (they are recorded for inspection) and
/// returns every identifier that was added with [`MemoryMailbox::insert`].
#[derive(Debug, Default)]
pub struct MemoryMailbox {
    messages: BTreeMap<MessageId, Option<Vec<u8>>>,
    failing: BTreeMap<MessageId, String>,
    searches: Vec<Vec<SearchTerm>>,
    fetched: Vec<MessageId>,
    logged_out: bool,
}

impl MemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message with a body.
    pub fn insert(&mut self, id: impl Into<MessageId>, raw: impl Into<Vec<u8>>) -> &mut Self {
        self.messages.insert(id.into(), Some(raw.into()));
        self
    }

    /// Add a message whose fetch returns no body.
    pub fn insert_empty(&mut self, id: impl Into<MessageId>) -> &mut Self {
        self.messages.insert(id.into(), None);
        self
    }

    /// Make fetching `id` fail with `reason`.
    pub fn fail(&mut self, id: impl Into<MessageId>, reason: &str) -> &mut Self {
        self.failing.insert(id.into(), reason.to_string());
        self
    }

    /// Term lists passed to `search`, in call order.
    pub fn searches(&self) -> &[Vec<SearchTerm>] {
        &self.searches
    }

    /// Identifiers passed to `fetch_raw`, in call order.
    pub fn fetched(&self) -> &[MessageId] {
        &self.fetched
    }

    /// Whether `logout` has been called.
    pub fn logged_out(&self) -> bool {
        self.logged_out
    }
}

impl Mailbox for MemoryMailbox {
    fn search(&mut self, terms: &[SearchTerm]) -> Result<Vec<MessageId>> {
        self.searches.push(terms.to_vec());
        Ok(self.messages.keys().cloned().collect())
    }

    fn fetch_raw(&mut self, id: &MessageId) -> Result<Vec<u8>> {
        self.fetched.push(id.clone());
        if let Some(reason) = self.failing.get(id) {
            return Err(Error::Fetch {
                id: id.clone(),
                reason: reason.clone(),
            });
        }
        match self.messages.get(id) {
            Some(Some(raw)) => Ok(raw.clone()),
            Some(None) => Err(Error::EmptyMessage(id.clone())),
            None => Err(Error::Fetch {
                id: id.clone(),
                reason: "no such message".to_string(),
            }),
        }
    }

    fn logout(&mut self) {
        self.logged_out = true;
    }
}
