//! Test helpers: a scripted storage backend and file fixtures.
//!
//! Run from workspace root: `cargo test -p aprova-upload`.

#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use std::sync::Arc;

use aprova_upload::{RecordingNotifier, UploadService, UploadSettings};

use storage::ScriptedStorage;

pub const BUCKET: &str = "creatives";

/// Service wired to a scripted backend and a recording notifier.
pub struct TestService {
    pub service: UploadService,
    pub storage: Arc<ScriptedStorage>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn setup_service(storage: ScriptedStorage) -> TestService {
    setup_service_with(storage, UploadSettings::new(BUCKET))
}

pub fn setup_service_with(storage: ScriptedStorage, settings: UploadSettings) -> TestService {
    let storage = Arc::new(storage);
    let notifier = Arc::new(RecordingNotifier::new());
    let service = UploadService::new(storage.clone(), notifier.clone(), settings);
    TestService {
        service,
        storage,
        notifier,
    }
}
