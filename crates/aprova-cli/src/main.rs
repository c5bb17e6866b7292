//! Aprova CLI: upload creatives to the configured storage backend.
//!
//! Configuration comes from the environment (and `.env`); see
//! `aprova_core::Config`. Results are printed as JSON on stdout,
//! notifications and logs go to stderr.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Context;
use aprova_cli::{init_tracing, notifier_for, read_files, FileReport};
use aprova_core::Config;
use aprova_storage::create_storage;
use aprova_upload::{Notification, UploadService, UploadSettings};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(name = "aprova", about = "Aprova Criativos upload client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and upload one or more files
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Key prefix, e.g. a client or campaign id
        #[arg(long)]
        prefix: Option<String>,
        /// Uploads in flight at once
        #[arg(long, default_value = "1")]
        concurrency: usize,
        /// Restrict accepted MIME types (repeatable)
        #[arg(long = "allow")]
        allowed_types: Vec<String>,
    },
    /// Check files against the upload policy without uploading
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print a short-lived view URL for an uploaded file
    Sign {
        /// Storage path returned by `upload`
        path: String,
    },
    /// Delete an uploaded file
    Delete {
        /// Storage path returned by `upload`
        path: String,
    },
}

#[derive(Serialize)]
struct SignedUrl<'a> {
    file_path: &'a str,
    url: String,
}

#[derive(Serialize)]
struct Deleted<'a> {
    file_path: &'a str,
    deleted: bool,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn print_notification(notification: &Notification) {
    match notification {
        Notification::Success(m) => eprintln!("✔ {}", m),
        Notification::Error(m) => eprintln!("✖ {}", m),
        Notification::Info(m) => eprintln!("ℹ {}", m),
    }
}

fn spawn_printer(mut notifications: UnboundedReceiver<Notification>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            print_notification(&notification);
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    if let Commands::Validate { files } = &cli.command {
        let constraints = config.file_constraints();
        let reports: Vec<FileReport> = read_files(files)
            .await?
            .iter()
            .map(|f| FileReport::check(f, &constraints, None))
            .collect();
        return print_json(&reports);
    }

    config.validate().context("Invalid configuration")?;
    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    let (notifier, notifications) = notifier_for(std::io::stderr().is_terminal());
    let printer = notifications.map(spawn_printer);
    let mut settings = UploadSettings::from_config(&config);
    if let Commands::Upload { allowed_types, .. } = &cli.command {
        if !allowed_types.is_empty() {
            settings = settings.with_allowed_types(allowed_types.iter().cloned());
        }
    }
    let service = UploadService::new(storage, notifier, settings).on_progress(|task| {
        tracing::debug!(
            file = %task.file_name,
            percent = task.progress_percent,
            status = ?task.status,
            "Upload progress"
        );
    });

    let outcome = match &cli.command {
        Commands::Upload {
            files,
            prefix,
            concurrency,
            ..
        } => {
            let files = read_files(files).await?;
            let prefix = prefix.as_deref();
            let uploaded = if *concurrency > 1 {
                service
                    .upload_multiple_concurrent(&files, prefix, *concurrency)
                    .await
            } else {
                service.upload_multiple(&files, prefix).await
            };
            print_json(&uploaded)
        }
        Commands::Sign { path } => {
            let url = service
                .signed_url(path)
                .await
                .with_context(|| format!("Failed to sign {}", path))?;
            print_json(&SignedUrl {
                file_path: path,
                url,
            })
        }
        Commands::Delete { path } => {
            let deleted = service.delete_file(path).await;
            print_json(&Deleted {
                file_path: path,
                deleted,
            })
        }
        Commands::Validate { .. } => Ok(()),
    };

    // Dropping the service closes the notification channel.
    drop(service);
    if let Some(printer) = printer {
        printer.await.ok();
    }
    outcome
}
