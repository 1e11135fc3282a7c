//! Persisting attachments: file naming and overwrite-aware writes.

pub mod attachment;
pub mod filename;
