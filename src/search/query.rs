//! Mailbox search construction.
//!
//! A [`SearchFilter`] describes which messages to pick up. [`build_query`]
//! turns it into an ordered list of [`SearchTerm`]s and [`render_imap`]
//! renders those as an IMAP `SEARCH` expression:
//!
//! - `since`     → `SINCE 01-Jan-2024`
//! - `before`    → `BEFORE 02-Jan-2024`
//! - unseen only → `UNSEEN`
//! - recipient   → `TO "user@example.com"`
//!
//! IMAP ANDs search keys, so the order carries no meaning for the server.
//! It is still fixed (since, before, seen-state, recipient) so the emitted
//! command is stable.

use std::fmt;

use chrono::NaiveDate;

/// Which messages to select from the folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Also select messages already marked as seen.
    pub include_seen: bool,
    /// Only messages received on or after this date.
    pub since: Option<NaiveDate>,
    /// Only messages received strictly before this date.
    pub before: Option<NaiveDate>,
    /// Only messages addressed to this recipient.
    pub recipient: Option<String>,
}

/// One key of a mailbox search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    Since(NaiveDate),
    Before(NaiveDate),
    Unseen,
    To(String),
}

/// Translate a filter into search terms.
///
/// Accepts an empty filter; with `include_seen` set and nothing else the
/// result is empty, which the mailbox treats as "everything".
pub fn build_query(filter: &SearchFilter) -> Vec<SearchTerm> {
    let mut terms = Vec::with_capacity(4);

    if let Some(date) = filter.since {
        terms.push(SearchTerm::Since(date));
    }
    if let Some(date) = filter.before {
        terms.push(SearchTerm::Before(date));
    }
    if !filter.include_seen {
        terms.push(SearchTerm::Unseen);
    }
    if let Some(ref recipient) = filter.recipient {
        terms.push(SearchTerm::To(recipient.clone()));
    }

    terms
}

/// Render terms as an IMAP `SEARCH` argument. No terms renders as `ALL`.
pub fn render_imap(terms: &[SearchTerm]) -> String {
    if terms.is_empty() {
        return "ALL".to_string();
    }
    terms
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Since(date) => write!(f, "SINCE {}", date.format("%d-%b-%Y")),
            Self::Before(date) => write!(f, "BEFORE {}", date.format("%d-%b-%Y")),
            Self::Unseen => f.write_str("UNSEEN"),
            Self::To(addr) => write!(f, "TO {}", quote(addr)),
        }
    }
}

/// IMAP quoted string: wrap in `"` and escape `"` and `\`.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}
