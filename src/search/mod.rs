//! Mailbox search: filter criteria and their translation into search terms.

pub mod query;

pub use self::query::{build_query, render_imap, SearchFilter, SearchTerm};
