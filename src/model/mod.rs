//! Core data model types: message identifiers and extracted attachments.

pub mod attachment;
pub mod message;
