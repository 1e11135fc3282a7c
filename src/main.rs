//! CLI entry point for `attachfetch`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use attachfetch::config::{self, Config, Settings};
use attachfetch::mailbox::imap::ImapClient;
use attachfetch::mailbox::Mailbox;
use attachfetch::model::message::MessageId;
use attachfetch::pipeline::{ExtractOptions, Extractor, RunSummary};
use attachfetch::search::SearchFilter;

#[derive(Parser)]
#[command(
    name = "attachfetch",
    version,
    about = "Fetch binary attachments from an IMAP folder",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    fetch: FetchArgs,

    /// Configuration file (default: $ATTACHFETCH_CONFIG or the user config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args)]
struct FetchArgs {
    /// Process these message ids instead of searching
    #[arg(
        long = "id",
        value_name = "ID",
        num_args = 1..,
        conflicts_with_all = ["since", "before", "seen"]
    )]
    ids: Vec<String>,

    /// Only messages received on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    since: Option<NaiveDate>,

    /// Only messages received before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    before: Option<NaiveDate>,

    /// Include messages already marked as seen
    #[arg(long)]
    seen: bool,

    /// Download directory (overrides local.directory)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Replace existing files (overrides local.overwrite)
    #[arg(long, conflicts_with = "no_overwrite")]
    overwrite: bool,

    /// Never replace existing files (overrides local.overwrite)
    #[arg(long)]
    no_overwrite: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => cmd_completions(shell),
        Some(Commands::Manpage) => cmd_manpage(),
        None => cmd_fetch(cli.fetch, cli.config.as_deref(), cli.verbose),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "attachfetch.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "attachfetch", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Connect, select the folder, and extract attachments.
fn cmd_fetch(args: FetchArgs, config_path: Option<&Path>, verbose: u8) -> anyhow::Result<()> {
    let config = config::load_config(config_path)?;

    let log_level = match verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let settings = config.validate()?;
    let options = extract_options(&args, &settings);
    let filter = SearchFilter {
        include_seen: args.seen,
        since: args.since,
        before: args.before,
        recipient: Some(settings.recipient.clone()),
    };
    let explicit: Vec<MessageId> = args.ids.into_iter().map(MessageId::from).collect();

    tracing::info!(server = %settings.server, "Logging in to server");
    let mut mailbox = ImapClient::connect(&settings.server, settings.port)?
        .login(&settings.username, &settings.password)?;
    mailbox.select(&settings.label)?;

    let summary = run_session(&mut mailbox, explicit, &filter, &options, args.json)?;
    tracing::info!("All done");

    if args.json {
        print_summary_json(&summary, &options)?;
    } else {
        print_summary_table(&summary, &options);
    }

    Ok(())
}

/// Extract from an open session, then log it out whatever the outcome.
fn run_session<M: Mailbox>(
    mailbox: &mut M,
    explicit: Vec<MessageId>,
    filter: &SearchFilter,
    options: &ExtractOptions,
    json: bool,
) -> anyhow::Result<RunSummary> {
    let result = extract(mailbox, explicit, filter, options, json);
    mailbox.logout();
    result
}

/// Resolve the message ids and run the pipeline with a progress bar.
fn extract<M: Mailbox>(
    mailbox: &mut M,
    explicit: Vec<MessageId>,
    filter: &SearchFilter,
    options: &ExtractOptions,
    json: bool,
) -> anyhow::Result<RunSummary> {
    let mut extractor = Extractor::new(mailbox, options.clone());
    let ids = extractor.resolve_ids(explicit, filter)?;

    let summary = if ids.is_empty() {
        if !json {
            println!("  No matching messages found.");
        }
        RunSummary::default()
    } else {
        let list: Vec<String> = ids.iter().map(ToString::to_string).collect();
        tracing::info!(ids = %list.join(", "), "Downloading messages");

        let pb = ProgressBar::new(ids.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Fetching [{bar:40.cyan/blue}] {pos}/{len}")
                .expect("valid template")
                .progress_chars("#>-"),
        );

        let summary = extractor.run(&ids, &|current, _total| {
            pb.set_position(current as u64);
        })?;
        pb.finish_and_clear();
        summary
    };

    Ok(summary)
}

/// Apply command line overrides to the configured storage settings.
fn extract_options(args: &FetchArgs, settings: &Settings) -> ExtractOptions {
    let overwrite = if args.overwrite {
        true
    } else if args.no_overwrite {
        false
    } else {
        settings.overwrite
    };

    ExtractOptions {
        output_dir: args
            .output
            .clone()
            .unwrap_or_else(|| settings.download_dir.clone()),
        overwrite,
    }
}

/// Print the run summary in a human-readable table.
fn print_summary_table(summary: &RunSummary, options: &ExtractOptions) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<25} {}", "Messages processed", summary.messages_processed);
    println!("  {:<25} {}", "Messages failed", summary.messages_failed);
    println!("  {:<25} {}", "Attachments written", summary.attachments_written);
    println!(
        "  {:<25} {}",
        "Skipped (already exist)", summary.attachments_skipped_existing
    );
    println!("  {:<25} {}", "Skipped (text)", summary.parts_skipped_text);
    println!("  {:<25} {}", "Failed parts", summary.parts_failed);
    println!(
        "  {:<25} {}",
        "Bytes written",
        format_size(summary.bytes_written, BINARY)
    );
    println!("  {:<25} {}", "Directory", options.output_dir.display());
    println!();
}

/// Print the run summary as JSON.
fn print_summary_json(summary: &RunSummary, options: &ExtractOptions) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "directory": options.output_dir.to_string_lossy(),
        "overwrite": options.overwrite,
        "summary": summary,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use attachfetch::mailbox::memory::MemoryMailbox;

    #[test]
    fn test_session_logged_out_when_run_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let mut mailbox = MemoryMailbox::new();
        mailbox.insert(1u32, "Subject: x\r\n\r\nbody\r\n");
        let options = ExtractOptions {
            output_dir: blocker.join("out"),
            overwrite: true,
        };

        let result = run_session(
            &mut mailbox,
            Vec::new(),
            &SearchFilter::default(),
            &options,
            true,
        );
        assert!(result.is_err());
        assert!(mailbox.logged_out());
    }

    #[test]
    fn test_session_logged_out_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut mailbox = MemoryMailbox::new();
        let options = ExtractOptions {
            output_dir: dir.path().to_path_buf(),
            overwrite: true,
        };

        let summary = run_session(
            &mut mailbox,
            Vec::new(),
            &SearchFilter::default(),
            &options,
            true,
        )
        .unwrap();
        assert_eq!(summary, RunSummary::default());
        assert!(mailbox.logged_out());
    }
}
