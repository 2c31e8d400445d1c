//! Shared utilities for service integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use mesh_service::directory::DirectoryError;
use mesh_service::protocol::{ServiceHandshake, WireTransport};
use mesh_service::{ServiceConfig, ServiceDelegate, ServiceDirectory, ServiceInfo};

/// Ordered record of directory calls and delegate callbacks.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

#[allow(dead_code)]
impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

/// Directory that records every call and can be told to fail them all.
#[derive(Clone, Default)]
pub struct RecordingDirectory {
    pub journal: Journal,
    failing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl RecordingDirectory {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing(journal: Journal) -> Self {
        let directory = Self::new(journal);
        directory.failing.store(true, Ordering::SeqCst);
        directory
    }

    fn outcome(&self, call: &str) -> Result<(), DirectoryError> {
        self.journal.push(format!("dir:{call}"));
        if self.failing.load(Ordering::SeqCst) {
            Err(DirectoryError::Unavailable("injected".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ServiceDirectory for RecordingDirectory {
    async fn add(&self, _info: &ServiceInfo) -> Result<(), DirectoryError> {
        self.outcome("add")
    }

    async fn register(&self, _uuid: &str) -> Result<(), DirectoryError> {
        self.outcome("register")
    }

    async fn unregister(&self, _uuid: &str) -> Result<(), DirectoryError> {
        self.outcome("unregister")
    }

    async fn remove(&self, _info: &ServiceInfo) -> Result<(), DirectoryError> {
        self.outcome("remove")
    }
}

/// Delegate that writes each callback into a journal.
#[derive(Clone, Default)]
pub struct RecordingDelegate {
    pub journal: Journal,
}

impl ServiceDelegate for RecordingDelegate {
    fn started(&self, _service: &ServiceInfo) {
        self.journal.push("delegate:started");
    }

    fn stopped(&self, _service: &ServiceInfo) {
        self.journal.push("delegate:stopped");
    }

    fn registered(&self, _service: &ServiceInfo) {
        self.journal.push("delegate:registered");
    }

    fn unregistered(&self, _service: &ServiceInfo) {
        self.journal.push("delegate:unregistered");
    }
}

/// Config on an ephemeral port with signal handling off.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.service.name = "test-service".into();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.shutdown.handle_signals = false;
    config
}

/// Connect without the client helper and read the service handshake.
#[allow(dead_code)]
pub async fn raw_handshake(addr: SocketAddr) -> (WireTransport<TcpStream>, ServiceHandshake) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut transport = WireTransport::new(stream, 64 * 1024);
    let handshake = tokio::time::timeout(Duration::from_secs(5), transport.recv())
        .await
        .expect("handshake timed out")
        .unwrap()
        .expect("service closed before handshake");
    (transport, handshake)
}

/// Poll `check` until it holds or two seconds pass.
#[allow(dead_code)]
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
