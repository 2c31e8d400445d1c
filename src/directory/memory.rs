//! In-process directory backed by a concurrent map.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::directory::{DirectoryError, ServiceDirectory};
use crate::service::ServiceInfo;

/// A directory that lives in the current process.
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    inner: Arc<DashMap<String, ServiceInfo>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an instance by uuid.
    pub fn get(&self, uuid: &str) -> Option<ServiceInfo> {
        self.inner.get(uuid).map(|r| r.value().clone())
    }

    /// Instances of `name` that are currently registered.
    pub fn registered(&self, name: &str) -> Vec<ServiceInfo> {
        self.inner
            .iter()
            .filter(|r| r.value().name == name && r.value().registered)
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn set_registered(&self, uuid: &str, registered: bool) -> Result<(), DirectoryError> {
        match self.inner.get_mut(uuid) {
            Some(mut entry) => {
                entry.registered = registered;
                Ok(())
            }
            None => Err(DirectoryError::NotFound(uuid.to_string())),
        }
    }
}

#[async_trait]
impl ServiceDirectory for InMemoryDirectory {
    async fn add(&self, info: &ServiceInfo) -> Result<(), DirectoryError> {
        self.inner.insert(info.uuid.clone(), info.clone());
        tracing::debug!(uuid = %info.uuid, name = %info.name, "Directory entry added");
        Ok(())
    }

    async fn register(&self, uuid: &str) -> Result<(), DirectoryError> {
        self.set_registered(uuid, true)
    }

    async fn unregister(&self, uuid: &str) -> Result<(), DirectoryError> {
        self.set_registered(uuid, false)
    }

    async fn remove(&self, info: &ServiceInfo) -> Result<(), DirectoryError> {
        match self.inner.remove(&info.uuid) {
            Some(_) => Ok(()),
            None => Err(DirectoryError::NotFound(info.uuid.clone())),
        }
    }
}
