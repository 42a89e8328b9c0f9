//! Per-origin connection limiter
//!
//! Requests are bounded per scheme, host and port, so two services on one
//! host but different ports get separate budgets.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

const MAX_TRACKED_HOSTS: usize = 1024;

/// Bounds concurrent requests per remote origin
#[derive(Debug, Clone)]
pub(crate) struct HostLimiter {
    limit: usize,
    hosts: Arc<Mutex<BTreeMap<String, Arc<Semaphore>>>>,
}

/// Held for as long as a request or its response body is alive
#[derive(Debug)]
pub(crate) struct HostPermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl HostLimiter {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            hosts: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub(crate) async fn acquire(&self, url: &Url) -> HostPermit {
        let Some(key) = origin_key(url) else {
            return HostPermit { _permit: None };
        };

        let semaphore = {
            let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
            if hosts.len() >= MAX_TRACKED_HOSTS {
                let limit = self.limit;
                hosts.retain(|_, semaphore| semaphore.available_permits() < limit);
            }
            hosts
                .entry(key)
                .or_insert_with(|| Arc::new(Semaphore::new(self.limit)))
                .clone()
        };

        // Semaphores here are never closed.
        HostPermit {
            _permit: semaphore.acquire_owned().await.ok(),
        }
    }

    #[cfg(test)]
    fn available(&self, url: &str) -> Option<usize> {
        let key = origin_key(&Url::parse(url).ok()?)?;
        let hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        hosts.get(&key).map(|semaphore| semaphore.available_permits())
    }
}

/// `scheme://host:port` with the scheme's default port filled in
fn origin_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    match url.port_or_known_default() {
        Some(port) => Some(format!("{}://{host}:{port}", url.scheme())),
        None => Some(format!("{}://{host}", url.scheme())),
    }
}
