//! Process-wide transport tuning
//!
//! Call [`init`] once from the process entry point before the first
//! [`crate::WebBrowser`] is built. Browsers created earlier freeze the
//! defaults in place.

use std::sync::OnceLock;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{HttpError, Result};

/// Default maximum number of concurrent connections per remote host
pub const MAX_CONNECTIONS: usize = 10;

/// Default time a socket may stay idle before it is recycled
pub const MAX_IDLE_TIME: Duration = Duration::from_secs(15);

static TUNING: OnceLock<TransportTuning> = OnceLock::new();

/// Transport settings shared by every browser in the process
///
/// Requests never carry `Expect: 100-continue`, so bodies are sent without
/// waiting for the server's interim response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportTuning {
    /// Concurrent connections allowed per remote host
    pub max_connections_per_host: usize,
    /// Idle time after which pooled sockets are closed
    pub idle_timeout: Duration,
}

impl Default for TransportTuning {
    fn default() -> Self {
        Self {
            max_connections_per_host: MAX_CONNECTIONS,
            idle_timeout: MAX_IDLE_TIME,
        }
    }
}

/// Apply process-wide tuning. Fails if tuning is already in effect.
pub fn init(tuning: TransportTuning) -> Result<()> {
    let applied = tuning.clone();
    TUNING
        .set(tuning)
        .map_err(|_| HttpError::AlreadyInitialized)?;
    info!(
        "Transport tuning applied: {} connections per host, {:?} idle timeout",
        applied.max_connections_per_host, applied.idle_timeout
    );
    Ok(())
}

/// Tuning currently in effect
pub fn current() -> &'static TransportTuning {
    TUNING.get_or_init(|| {
        debug!("Transport tuning not initialized, using defaults");
        TransportTuning::default()
    })
}
