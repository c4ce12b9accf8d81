//! CLI entry point for `maildepot`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use maildepot::config::{self, Config};
use maildepot::handler::private_files::PrivateFilesHandler;
use maildepot::handler::{DeliveryOutcome, MessageHandler};
use maildepot::model::message::InboundRecord;
use maildepot::quota::{self, QuotaCeiling};
use maildepot::security::policy::UserDirectory;
use maildepot::security::UserContext;
use maildepot::storage::filesystem::FsFileStorage;
use maildepot::storage::{FileAreaKey, FileStorage};

#[derive(Parser)]
#[command(
    name = "maildepot",
    version,
    about = "Deliver attachments from inbound email into per-user private file areas"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Deliver raw messages (.eml) to a user's private files
    Deliver {
        /// Raw RFC 5322 message files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Recipient user id
        #[arg(short, long)]
        user: u64,
        #[arg(long)]
        json: bool,
    },
    /// List a user's private file area
    Ls {
        /// User id
        #[arg(short, long)]
        user: u64,
        #[arg(long)]
        json: bool,
    },
    /// Show quota usage for a user
    Usage {
        /// User id
        #[arg(short, long)]
        user: u64,
        #[arg(long)]
        json: bool,
    },
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

    // Load configuration
    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level);

    match cli.command {
        Commands::Deliver { files, user, json } => cmd_deliver(&config, &files, user, json),
        Commands::Ls { user, json } => cmd_ls(&config, user, json),
        Commands::Usage { user, json } => cmd_usage(&config, user, json),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = config::log_dir();
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "maildepot.log");
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
    clap_complete::generate(shell, &mut cmd, "maildepot", &mut std::io::stdout());
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

/// Run raw messages through the private-files handler.
fn cmd_deliver(config: &Config, files: &[PathBuf], user_id: u64, json: bool) -> anyhow::Result<()> {
    for file in files {
        if !file.exists() {
            anyhow::bail!("File not found: {}", file.display());
        }
    }

    let storage = FsFileStorage::new(config::storage_root(config));
    let access = config.static_access();
    let recipient = access
        .user(user_id)
        .ok_or_else(|| anyhow::anyhow!("Unknown user id {user_id}"))?;
    let handler = PrivateFilesHandler::new(&storage, &access, &access, config.site_settings());

    let pb = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Delivering [{bar:40.cyan/blue}] {pos}/{len}")
                .expect("valid template")
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut outcomes: Vec<(PathBuf, DeliveryOutcome)> = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        if let Some(pb) = &pb {
            pb.set_position(i as u64);
        }

        let raw = std::fs::read(file)?;
        let data = maildepot::intake::message_data_from_eml(&raw)?;
        let record = InboundRecord {
            id: i as u64 + 1,
            user_id,
            address: recipient.email.clone(),
            received_at: chrono::Utc::now(),
        };

        let outcome = handler.process_message(&record, &data)?;
        outcomes.push((file.clone(), outcome));
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if json {
        print_delivery_json(&outcomes)?;
    } else {
        print_delivery_table(&outcomes);
    }

    Ok(())
}

/// List a user's private file area.
fn cmd_ls(config: &Config, user_id: u64, json: bool) -> anyhow::Result<()> {
    let storage = FsFileStorage::new(config::storage_root(config));
    let access = config.static_access();
    let user = access
        .user(user_id)
        .ok_or_else(|| anyhow::anyhow!("Unknown user id {user_id}"))?;

    let context = UserContext::for_user(&user);
    let records = storage.list_area(&FileAreaKey::user_private(context.id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    use humansize::{format_size, BINARY};

    println!();
    println!("  {} file(s) in {}'s private area", records.len(), user.username);
    println!();

    if records.is_empty() {
        return Ok(());
    }

    println!(
        "  {:<40} {:>10} {:<25} {:<17}",
        "Name", "Size", "Author", "Stored"
    );
    println!("  {}", "-".repeat(95));
    for record in &records {
        let name_trunc: String = record.filename.chars().take(39).collect();
        println!(
            "  {:<40} {:>10} {:<25} {:<17}",
            name_trunc,
            format_size(record.size, BINARY),
            record.author.chars().take(24).collect::<String>(),
            record.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!();

    Ok(())
}

/// Show quota usage for a user.
fn cmd_usage(config: &Config, user_id: u64, json: bool) -> anyhow::Result<()> {
    let storage = FsFileStorage::new(config::storage_root(config));
    let access = config.static_access();
    let user = access
        .user(user_id)
        .ok_or_else(|| anyhow::anyhow!("Unknown user id {user_id}"))?;

    let context = UserContext::for_user(&user);
    let area = FileAreaKey::user_private(context.id);
    let used = storage.area_bytes_used(&area)?;
    let ceiling = quota::ceiling_for(&user, &context, &access, config.quota.user_quota_bytes);

    if json {
        let quota_json = match ceiling {
            QuotaCeiling::Limited(max) => serde_json::json!(max),
            QuotaCeiling::Unlimited => serde_json::Value::Null,
        };
        let output = serde_json::json!({
            "user": user.username,
            "used_bytes": used,
            "quota_bytes": quota_json,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<12} {}", "User", user.username);
    println!("  {:<12} {}", "Used", format_size(used, BINARY));
    match ceiling {
        QuotaCeiling::Limited(max) => {
            println!("  {:<12} {}", "Quota", format_size(max, BINARY));
            let percent = if max == 0 {
                100.0
            } else {
                used as f64 / max as f64 * 100.0
            };
            println!("  {:<12} {percent:.1}%", "In use");
        }
        QuotaCeiling::Unlimited => {
            println!("  {:<12} unlimited", "Quota");
        }
    }
    println!();

    Ok(())
}

/// Print delivery outcomes as a human-readable table.
fn print_delivery_table(outcomes: &[(PathBuf, DeliveryOutcome)]) {
    use humansize::{format_size, BINARY};

    let mut uploaded = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for (file, outcome) in outcomes {
        println!();
        println!("  {}", display_name(file));
        if outcome.total() == 0 {
            println!("    no attachments");
            continue;
        }
        for record in &outcome.uploaded {
            println!(
                "    stored   {} ({})",
                record.filename,
                format_size(record.size, BINARY)
            );
        }
        for skip in &outcome.skipped {
            println!(
                "    skipped  {} ({}) — over quota",
                skip.filename,
                format_size(skip.size, BINARY)
            );
        }
        for fail in &outcome.failed {
            println!("    failed   {} — {}", fail.filename, fail.reason);
        }
        uploaded += outcome.uploaded.len();
        skipped += outcome.skipped.len();
        failed += outcome.failed.len();
    }

    println!();
    println!("  {uploaded} stored, {skipped} skipped, {failed} failed");
    println!();
}

/// Print delivery outcomes as JSON.
fn print_delivery_json(outcomes: &[(PathBuf, DeliveryOutcome)]) -> anyhow::Result<()> {
    let messages: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|(file, outcome)| {
            serde_json::json!({
                "file": file.to_string_lossy(),
                "uploaded": outcome.uploaded,
                "skipped": outcome.skipped,
                "failed": outcome.failed,
            })
        })
        .collect();

    let output = serde_json::json!({
        "message_count": outcomes.len(),
        "messages": messages,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
