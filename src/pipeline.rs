//! The extraction pipeline: fetch → walk → decode → classify → name → write.
//!
//! Messages are processed strictly one after another over a single mailbox
//! session. Failures are contained at the smallest scope that makes sense:
//! a bad message is logged and the batch continues, a bad part is logged and
//! the rest of the message is still processed, a failed write only loses
//! that one attachment.

use std::path::PathBuf;

use mail_parser::Message;

use crate::error::{Error, Result};
use crate::export::attachment::{write_attachment, WriteOutcome};
use crate::export::filename::FilenameResolver;
use crate::mailbox::Mailbox;
use crate::model::attachment::ExtractedAttachment;
use crate::model::message::MessageId;
use crate::parser::classify::is_binary;
use crate::parser::{mime, walker};
use crate::search::query::{build_query, SearchFilter};

/// Where and how attachments are written.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Destination directory; created if missing.
    pub output_dir: PathBuf,
    /// Replace existing files instead of skipping them.
    pub overwrite: bool,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunSummary {
    /// Messages fetched and parsed.
    pub messages_processed: usize,
    /// Messages that could not be fetched or parsed.
    pub messages_failed: usize,
    /// Attachment files written.
    pub attachments_written: usize,
    /// Attachments not written because the file already existed.
    pub attachments_skipped_existing: usize,
    /// Disposition-bearing parts whose payload looked like text.
    pub parts_skipped_text: usize,
    /// Parts that failed to decode or attachments that failed to write.
    pub parts_failed: usize,
    /// Total payload bytes written.
    pub bytes_written: u64,
}

/// Attachment-worthy payloads of one message.
#[derive(Debug, Default)]
pub struct Selection<'a> {
    /// Binary payloads with resolved names, in document order.
    pub attachments: Vec<ExtractedAttachment<'a>>,
    /// Candidate parts left out because they classified as text.
    pub textual: usize,
    /// Per-part decode failures.
    pub failures: Vec<Error>,
}

/// Pick the binary, disposition-bearing parts of a parsed message and name
/// them.
pub fn select_attachments<'a>(
    message: &'a Message<'a>,
    message_id: &'a MessageId,
) -> Selection<'a> {
    let mut selection = Selection::default();
    let mut names = FilenameResolver::new(message_id);

    for part in walker::candidates(message) {
        let payload = match part.decode(message_id) {
            Ok(payload) => payload,
            Err(e) => {
                selection.failures.push(e);
                continue;
            }
        };

        if !is_binary(&payload) {
            tracing::debug!(
                message = %message_id,
                part = part.index,
                content_type = %part.content_type(),
                "Textual payload, skipping"
            );
            selection.textual += 1;
            continue;
        }

        selection.attachments.push(ExtractedAttachment {
            message_id,
            part_index: part.index,
            filename: names.resolve(&part),
            payload,
        });
    }

    selection
}

/// Runs the pipeline against one mailbox session.
pub struct Extractor<'m, M: Mailbox> {
    mailbox: &'m mut M,
    options: ExtractOptions,
    summary: RunSummary,
}

impl<'m, M: Mailbox> Extractor<'m, M> {
    pub fn new(mailbox: &'m mut M, options: ExtractOptions) -> Self {
        Self {
            mailbox,
            options,
            summary: RunSummary::default(),
        }
    }

    /// Messages to process: `explicit` if non-empty, otherwise the result of
    /// searching with `filter`.
    pub fn resolve_ids(
        &mut self,
        explicit: Vec<MessageId>,
        filter: &SearchFilter,
    ) -> Result<Vec<MessageId>> {
        if !explicit.is_empty() {
            return Ok(explicit);
        }
        let terms = build_query(filter);
        self.mailbox.search(&terms)
    }

    /// Process every identifier and return the summary.
    ///
    /// Only a missing/uncreatable output directory aborts; everything else is
    /// logged and counted. `progress` receives `(done, total)`.
    pub fn run(
        mut self,
        ids: &[MessageId],
        progress: &dyn Fn(usize, usize),
    ) -> Result<RunSummary> {
        std::fs::create_dir_all(&self.options.output_dir)
            .map_err(|e| Error::write(&self.options.output_dir, e))?;

        let total = ids.len();
        for (i, id) in ids.iter().enumerate() {
            progress(i, total);
            if let Err(e) = self.process_message(id) {
                tracing::error!(message = %id, error = %e, "Skipping message");
                self.summary.messages_failed += 1;
            }
        }
        progress(total, total);

        Ok(self.summary)
    }

    /// Fetch one message and persist its attachments.
    ///
    /// Errors returned here concern the whole message; part- and
    /// attachment-level failures are logged and counted internally.
    pub fn process_message(&mut self, id: &MessageId) -> Result<()> {
        tracing::info!(message = %id, "Working on message");
        let raw = self.mailbox.fetch_raw(id)?;
        let message = mime::parse_message(&raw).ok_or_else(|| Error::Parse(id.clone()))?;
        tracing::info!(message = %id, subject = %mime::subject(&message), "Parsing message");
        self.summary.messages_processed += 1;

        let selection = select_attachments(&message, id);
        self.summary.parts_skipped_text += selection.textual;
        for e in &selection.failures {
            tracing::warn!(error = %e, "Skipping part");
        }
        self.summary.parts_failed += selection.failures.len();

        for attachment in &selection.attachments {
            match write_attachment(attachment, &self.options.output_dir, self.options.overwrite) {
                Ok(WriteOutcome::Written) => {
                    self.summary.attachments_written += 1;
                    self.summary.bytes_written += attachment.payload.len() as u64;
                }
                Ok(WriteOutcome::Skipped) => self.summary.attachments_skipped_existing += 1,
                Err(e) => {
                    tracing::warn!(
                        message = %id,
                        part = attachment.part_index,
                        filename = %attachment.filename,
                        error = %e,
                        "Failed to save attachment"
                    );
                    self.summary.parts_failed += 1;
                }
            }
        }

        Ok(())
    }
}
