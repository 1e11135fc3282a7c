//! `attachfetch` — pull binary attachments out of an IMAP mailbox.
//!
//! This crate provides the extraction pipeline: building the mailbox search,
//! walking each message's MIME tree, telling binary payloads from text,
//! naming anonymous parts, and writing files under an overwrite policy.

pub mod config;
pub mod error;
pub mod export;
pub mod mailbox;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod search;
