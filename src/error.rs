//! Centralized error types for attachfetch.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::message::MessageId;

/// All errors produced by the attachfetch library.
///
/// `Config`, `Auth`, `Connect`, `Select` and `Search` end the run. The
/// remaining variants are scoped to one message, one part or one attachment
/// and are logged by the pipeline before it moves on.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded or is missing required fields.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The server rejected the credentials.
    #[error("Login failed for '{username}': {reason}")]
    Auth { username: String, reason: String },

    /// Could not open a TLS session to the server.
    #[error("Could not connect to '{server}': {reason}")]
    Connect { server: String, reason: String },

    /// The folder/label could not be selected.
    #[error("Could not select folder '{label}': {reason}")]
    Select { label: String, reason: String },

    /// The server rejected the search expression.
    #[error("Search '{query}' failed: {reason}")]
    Search { query: String, reason: String },

    /// The adapter reported an error while fetching a message.
    #[error("Fetch of message {id} failed: {reason}")]
    Fetch { id: MessageId, reason: String },

    /// The fetch succeeded but carried no message body.
    #[error("Message {0} has no body")]
    EmptyMessage(MessageId),

    /// The fetched bytes could not be parsed as a MIME message.
    #[error("Message {0} could not be parsed")]
    Parse(MessageId),

    /// A part declared a Content-Transfer-Encoding we cannot decode.
    #[error("Part {part} of message {id}: unrecognized transfer encoding '{encoding}'")]
    Decode {
        id: MessageId,
        part: usize,
        encoding: String,
    },

    /// The part body is not valid for its declared transfer encoding.
    #[error("Part {part} of message {id}: body is not valid {encoding}")]
    Corrupt {
        id: MessageId,
        part: usize,
        encoding: String,
    },

    /// A declared filename would escape the download directory.
    #[error("Refusing unsafe attachment filename '{0}'")]
    UnsafeFilename(String),

    /// Writing an attachment to disk failed.
    #[error("I/O error writing '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a `Write` variant from a path and an `io::Error`.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Auth { .. }
                | Self::Connect { .. }
                | Self::Select { .. }
                | Self::Search { .. }
        )
    }
}
