//! Integration tests for the extraction pipeline, from raw message to files on disk.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use predicates::prelude::*;

use attachfetch::error::Error;
use attachfetch::export::attachment::{write_attachment, WriteOutcome};
use attachfetch::mailbox::memory::MemoryMailbox;
use attachfetch::model::attachment::ExtractedAttachment;
use attachfetch::model::message::MessageId;
use attachfetch::parser::mime::parse_message;
use attachfetch::parser::walker::{candidates, walk, MessagePart};
use attachfetch::pipeline::{select_attachments, ExtractOptions, Extractor};
use attachfetch::search::{build_query, SearchFilter, SearchTerm};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture(name)).unwrap()
}

fn options(dir: &Path, overwrite: bool) -> ExtractOptions {
    ExtractOptions {
        output_dir: dir.to_path_buf(),
        overwrite,
    }
}

// ─── Container + text part + named binary → only the binary ─────────

#[test]
fn test_report_yields_single_attachment() {
    let raw = read_fixture("report.eml");
    let message = parse_message(&raw).unwrap();
    let id = MessageId::from(1u32);

    let nodes: Vec<_> = walk(&message).collect();
    assert_eq!(nodes.len(), 3);
    assert!(matches!(nodes[0], MessagePart::Container { .. }));

    // The text part carries a disposition, so it is a candidate...
    assert_eq!(candidates(&message).count(), 2);

    // ...but only the binary payload survives classification.
    let selection = select_attachments(&message, &id);
    assert_eq!(selection.attachments.len(), 1);
    assert_eq!(selection.textual, 1);
    assert!(selection.failures.is_empty());

    let attachment = &selection.attachments[0];
    assert_eq!(attachment.filename, "report.bin");
    assert_eq!(attachment.part_index, 2);
    assert_eq!(&*attachment.payload, (0u8..16).collect::<Vec<_>>().as_slice());
}

// ─── Anonymous parts differ only in the ordinal ─────────────────────

#[test]
fn test_anonymous_parts_get_ordinals() {
    let raw = read_fixture("anonymous.eml");
    let message = parse_message(&raw).unwrap();
    let id = MessageId::from(42u32);

    let selection = select_attachments(&message, &id);
    let names: Vec<_> = selection
        .attachments
        .iter()
        .map(|a| a.filename.as_str())
        .collect();
    assert_eq!(names, vec!["msg-42-part-001.bin", "msg-42-part-002.bin"]);
}

// ─── Unknown transfer encoding fails that part only ─────────────────

#[test]
fn test_bad_encoding_is_per_part() {
    let raw = read_fixture("bad_encoding.eml");
    let message = parse_message(&raw).unwrap();
    let id = MessageId::from(7u32);

    let selection = select_attachments(&message, &id);
    assert_eq!(selection.failures.len(), 1);
    match &selection.failures[0] {
        Error::Decode { part, encoding, .. } => {
            assert_eq!(*part, 1);
            assert_eq!(encoding, "x-rot13");
        }
        other => panic!("expected decode error, got {other:?}"),
    }
    assert_eq!(selection.attachments.len(), 1);
    assert_eq!(selection.attachments[0].filename, "good.bin");
    assert_eq!(&*selection.attachments[0].payload, &[0x00, 0xFF, 0x00, 0xFF]);
}

// ─── Text-labelled parts keep their raw decoded bytes ───────────────

#[test]
fn test_mislabelled_text_parts_are_not_charset_converted() {
    let raw = read_fixture("mislabelled.eml");
    let message = parse_message(&raw).unwrap();
    let id = MessageId::from(8u32);

    let selection = select_attachments(&message, &id);
    assert!(selection.failures.is_empty());
    assert_eq!(selection.textual, 0);

    let files: Vec<_> = selection
        .attachments
        .iter()
        .map(|a| (a.filename.as_str(), a.payload.to_vec()))
        .collect();
    assert_eq!(
        files,
        vec![
            ("latin.dat", vec![0x00, 0xE9, 0x01]),
            ("raw.dat", vec![0x00, 0xFF, 0xFE]),
            ("qp.dat", vec![0x00, 0xFF, b'o', b'k']),
        ]
    );
}

// ─── Corrupt base64 is a reported failure, not text ─────────────────

#[test]
fn test_corrupt_base64_is_reported() {
    let raw = read_fixture("corrupt.eml");
    let message = parse_message(&raw).unwrap();
    let id = MessageId::from(9u32);

    let selection = select_attachments(&message, &id);
    assert_eq!(selection.textual, 0);
    assert_eq!(selection.failures.len(), 1);
    match &selection.failures[0] {
        Error::Corrupt { part, encoding, .. } => {
            assert_eq!(*part, 2);
            assert_eq!(encoding, "base64");
        }
        other => panic!("expected corrupt part, got {other:?}"),
    }
    assert_eq!(selection.attachments.len(), 1);
    assert_eq!(selection.attachments[0].filename, "intact.bin");
}

#[test]
fn test_corrupt_part_counts_as_failed() {
    let out = assert_fs::TempDir::new().unwrap();
    let mut mailbox = MemoryMailbox::new();
    mailbox.insert(1u32, read_fixture("corrupt.eml"));

    let summary = Extractor::new(&mut mailbox, options(out.path(), true))
        .run(&[MessageId::from(1u32)], &|_, _| {})
        .unwrap();

    assert_eq!(summary.parts_failed, 1);
    assert_eq!(summary.parts_skipped_text, 0);
    assert_eq!(summary.attachments_written, 1);
    out.child("intact.bin").assert(predicate::path::is_file());
    out.child("damaged.bin").assert(predicate::path::missing());
}

// ─── Walker descends into forwarded messages ────────────────────────

#[test]
fn test_forwarded_message_attachment_found() {
    let raw = read_fixture("forwarded.eml");
    let message = parse_message(&raw).unwrap();
    let id = MessageId::from(3u32);

    let containers = walk(&message)
        .filter(|node| matches!(node, MessagePart::Container { .. }))
        .count();
    assert_eq!(containers, 3, "outer multipart, message/rfc822, inner multipart");

    let selection = select_attachments(&message, &id);
    assert_eq!(selection.attachments.len(), 1);
    assert_eq!(selection.attachments[0].filename, "invoice.pdf");
    assert!(selection.attachments[0].payload.starts_with(b"%PDF-1.4"));
}

// ─── Whole pipeline against an in-memory mailbox ────────────────────

#[test]
fn test_pipeline_writes_files() {
    let out = assert_fs::TempDir::new().unwrap();
    let mut mailbox = MemoryMailbox::new();
    mailbox
        .insert(1u32, read_fixture("report.eml"))
        .insert(2u32, read_fixture("anonymous.eml"))
        .insert(3u32, b"not a mail message at all".to_vec());

    let filter = SearchFilter {
        recipient: Some("billing@example.com".to_string()),
        ..Default::default()
    };
    let mut extractor = Extractor::new(&mut mailbox, options(out.path(), false));
    let ids = extractor.resolve_ids(Vec::new(), &filter).unwrap();
    let summary = extractor.run(&ids, &|_, _| {}).unwrap();

    assert_eq!(
        mailbox.searches(),
        &[build_query(&filter)],
        "search must use the built query"
    );
    assert_eq!(mailbox.searches()[0][0], SearchTerm::Unseen);

    out.child("report.bin").assert(predicate::path::is_file());
    out.child("msg-2-part-001.bin").assert(predicate::path::is_file());
    out.child("msg-2-part-002.bin").assert(predicate::path::is_file());
    assert_eq!(summary.attachments_written, 3);
    assert_eq!(summary.parts_skipped_text, 1);
    assert_eq!(summary.bytes_written, 16 + 13 + 19);
}

#[test]
fn test_pipeline_overwrite_policy() {
    let out = assert_fs::TempDir::new().unwrap();
    out.child("report.bin").write_str("keep me").unwrap();

    let mut mailbox = MemoryMailbox::new();
    mailbox.insert(1u32, read_fixture("report.eml"));
    let ids = vec![MessageId::from(1u32)];

    let summary = Extractor::new(&mut mailbox, options(out.path(), false))
        .run(&ids, &|_, _| {})
        .unwrap();
    assert_eq!(summary.attachments_skipped_existing, 1);
    out.child("report.bin").assert("keep me");

    let summary = Extractor::new(&mut mailbox, options(out.path(), true))
        .run(&ids, &|_, _| {})
        .unwrap();
    assert_eq!(summary.attachments_written, 1);
    assert_eq!(
        std::fs::read(out.child("report.bin").path()).unwrap(),
        (0u8..16).collect::<Vec<_>>()
    );
}

#[test]
fn test_pipeline_rejects_traversal_but_keeps_going() {
    let root = assert_fs::TempDir::new().unwrap();
    let out = root.child("inbox");

    let mut mailbox = MemoryMailbox::new();
    mailbox.insert(1u32, read_fixture("traversal.eml"));
    let summary = Extractor::new(&mut mailbox, options(out.path(), true))
        .run(&[MessageId::from(1u32)], &|_, _| {})
        .unwrap();

    assert_eq!(summary.parts_failed, 1);
    assert_eq!(summary.attachments_written, 1);
    out.child("safe.bin").assert(predicate::path::is_file());
    root.child("evil.bin").assert(predicate::path::missing());
}

#[test]
fn test_empty_and_failed_fetches_are_counted() {
    let out = assert_fs::TempDir::new().unwrap();
    let mut mailbox = MemoryMailbox::new();
    mailbox
        .insert_empty(1u32)
        .fail(2u32, "BAD command")
        .insert(3u32, read_fixture("report.eml"));
    let ids: Vec<MessageId> = (1u32..=3).map(MessageId::from).collect();

    let summary = Extractor::new(&mut mailbox, options(out.path(), true))
        .run(&ids, &|_, _| {})
        .unwrap();

    assert_eq!(summary.messages_failed, 2);
    assert_eq!(summary.messages_processed, 1);
    assert_eq!(summary.attachments_written, 1);
}

#[test]
fn test_write_skips_existing_file_unchanged() {
    let out = assert_fs::TempDir::new().unwrap();
    out.child("scan.bin").write_binary(b"\x01\x02").unwrap();

    let id = MessageId::from(1u32);
    let attachment = ExtractedAttachment {
        message_id: &id,
        part_index: 1,
        filename: "scan.bin".to_string(),
        payload: Cow::Borrowed(&b"\x00\x00\x00"[..]),
    };
    let outcome = write_attachment(&attachment, out.path(), false).unwrap();
    assert_eq!(outcome, WriteOutcome::Skipped);
    assert_eq!(std::fs::read(out.child("scan.bin").path()).unwrap(), b"\x01\x02");
}
