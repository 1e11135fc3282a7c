//! Email parsing: MIME decoding, part traversal, and payload classification.

pub mod classify;
pub mod mime;
pub mod walker;
