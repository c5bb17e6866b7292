use std::path::Path;
use std::sync::Arc;

use aprova_core::{FileConstraints, ValidationResult};
use aprova_upload::{ChannelNotifier, Notification, Notifier, TracingNotifier, UploadFile};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;

/// Validation outcome for one local file, as printed by `aprova validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub content_type: String,
    pub size_bytes: u64,
    #[serde(flatten)]
    pub result: ValidationResult,
}

impl FileReport {
    pub fn check(
        file: &UploadFile,
        constraints: &FileConstraints,
        allowed_types: Option<&[String]>,
    ) -> Self {
        Self {
            file: file.name.clone(),
            content_type: file.content_type.clone(),
            size_bytes: file.size(),
            result: constraints.validate(file, allowed_types),
        }
    }
}

/// Read every path, failing on the first unreadable one.
pub async fn read_files(paths: &[impl AsRef<Path>]) -> anyhow::Result<Vec<UploadFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let file = UploadFile::from_path(path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        files.push(file);
    }
    Ok(files)
}

/// Pick the notification sink for the CLI.
///
/// On an interactive terminal notifications are forwarded to the returned
/// receiver for printing; otherwise they are logged with the rest of the
/// output.
pub fn notifier_for(
    interactive: bool,
) -> (Arc<dyn Notifier>, Option<UnboundedReceiver<Notification>>) {
    if interactive {
        let (notifier, notifications) = ChannelNotifier::new();
        (Arc::new(notifier), Some(notifications))
    } else {
        (Arc::new(TracingNotifier), None)
    }
}

/// Initialize tracing for CLI binaries.
///
/// Logs go to stderr so stdout stays parseable JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
