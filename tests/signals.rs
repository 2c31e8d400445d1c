//! Termination signals drive a graceful shutdown.
//!
//! Lives in its own test binary: the signal goes to the whole process.

#![cfg(unix)]

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use mesh_service::service::EchoHandler;
use mesh_service::Service;

mod common;
use common::{Journal, RecordingDelegate, RecordingDirectory};

#[tokio::test]
async fn test_sigterm_shuts_down_gracefully() {
    let journal = Journal::default();
    let mut config = common::test_config();
    config.shutdown.handle_signals = true;

    let handle = Service::new(
        config,
        Arc::new(EchoHandler),
        Arc::new(RecordingDirectory::new(journal.clone())),
    )
    .with_delegate(Arc::new(RecordingDelegate {
        journal: journal.clone(),
    }))
    .start(true)
    .await
    .unwrap();
    assert!(handle.info().await.unwrap().registered);

    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("shutdown did not complete")
        .unwrap();

    assert_eq!(journal.count("dir:unregister"), 1);
    assert_eq!(journal.count("dir:remove"), 1);
    assert_eq!(journal.count("delegate:stopped"), 1);
}
