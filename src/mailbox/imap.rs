//! IMAP implementation of [`Mailbox`] using the `imap` crate (sync, TLS).

use std::net::TcpStream;

use native_tls::{TlsConnector, TlsStream};

use crate::error::{Error, Result};
use crate::model::message::MessageId;
use crate::search::query::{render_imap, SearchTerm};

use super::Mailbox;

type Session = ::imap::Session<TlsStream<TcpStream>>;

/// An open, not yet authenticated IMAPS connection.
pub struct ImapClient {
    server: String,
    client: ::imap::Client<TlsStream<TcpStream>>,
}

impl ImapClient {
    /// Open a TLS connection to `server:port`.
    pub fn connect(server: &str, port: u16) -> Result<Self> {
        let tls = TlsConnector::builder()
            .build()
            .map_err(|e| Error::Connect {
                server: server.to_string(),
                reason: format!("TLS connector build failed: {e}"),
            })?;

        let client =
            ::imap::connect((server, port), server, &tls).map_err(|e| Error::Connect {
                server: server.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(server, port, "Connected");
        Ok(Self {
            server: server.to_string(),
            client,
        })
    }

    /// Authenticate with username and password.
    pub fn login(self, username: &str, password: &str) -> Result<ImapMailbox> {
        let session = self
            .client
            .login(username, password)
            .map_err(|(e, _client)| Error::Auth {
                username: username.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(server = %self.server, username, "Logged in");
        Ok(ImapMailbox {
            session,
            folder: None,
        })
    }
}

/// An authenticated IMAP session.
///
/// Identifiers are message sequence numbers, as in a plain `SEARCH`.
pub struct ImapMailbox {
    session: Session,
    folder: Option<String>,
}

impl ImapMailbox {
    /// Select the folder (Gmail: label) that later searches run against.
    pub fn select(&mut self, label: &str) -> Result<()> {
        let mailbox = self.session.select(label).map_err(|e| Error::Select {
            label: label.to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!(folder = label, exists = mailbox.exists, "Selected folder");
        self.folder = Some(label.to_string());
        Ok(())
    }
}

impl Mailbox for ImapMailbox {
    fn search(&mut self, terms: &[SearchTerm]) -> Result<Vec<MessageId>> {
        let query = render_imap(terms);
        tracing::debug!(query = %query, folder = ?self.folder, "SEARCH");

        let found = self.session.search(&query).map_err(|e| Error::Search {
            query: query.clone(),
            reason: e.to_string(),
        })?;

        let mut seqs: Vec<u32> = found.into_iter().collect();
        seqs.sort_unstable();
        Ok(seqs.into_iter().map(MessageId::from).collect())
    }

    fn fetch_raw(&mut self, id: &MessageId) -> Result<Vec<u8>> {
        let fetches = self
            .session
            .fetch(id.as_str(), "RFC822")
            .map_err(|e| Error::Fetch {
                id: id.clone(),
                reason: e.to_string(),
            })?;

        fetches
            .iter()
            .find_map(|fetch| fetch.body())
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::EmptyMessage(id.clone()))
    }

    fn logout(&mut self) {
        match self.session.logout() {
            Ok(()) => tracing::debug!("Logged out"),
            Err(e) => tracing::warn!(error = %e, "Logout failed"),
        }
    }
}
