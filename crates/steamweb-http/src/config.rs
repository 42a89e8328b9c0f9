//! Web browser configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of attempts for a single public operation
pub const MAX_TRIES: u8 = 5;

/// Default number of redirect hops followed by one logical request
pub const MAX_REDIRECTS: u8 = 5;

/// Identity components used to build the `User-Agent` header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductIdentity {
    pub name: String,
    pub version: String,
    pub url: String,
}

impl Default for ProductIdentity {
    fn default() -> Self {
        Self {
            name: "SteamWeb".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            url: env!("CARGO_PKG_REPOSITORY").to_string(),
        }
    }
}

impl ProductIdentity {
    /// Render as `name/version (+url)`
    pub fn user_agent(&self) -> String {
        format!("{}/{} (+{})", self.name, self.version, self.url)
    }
}

/// Web browser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebBrowserConfig {
    /// Per-request timeout
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: Duration,

    /// Multiplier applied to the timeout of large-payload browsers
    #[serde(default = "default_extended_timeout_multiplier")]
    pub extended_timeout_multiplier: u32,

    /// HTTP/HTTPS proxy URL
    #[serde(default)]
    pub proxy: Option<String>,

    /// Identity sent with every request
    #[serde(default)]
    pub identity: ProductIdentity,

    /// Attempts used when an operation does not say otherwise
    #[serde(default = "default_max_tries")]
    pub max_tries: u8,

    /// Redirect hops followed by one logical request
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u8,

    /// Log request lines and raw bodies of failed responses
    #[serde(default)]
    pub user_debugging: bool,
}

impl Default for WebBrowserConfig {
    fn default() -> Self {
        Self {
            connection_timeout: default_connection_timeout(),
            extended_timeout_multiplier: default_extended_timeout_multiplier(),
            proxy: None,
            identity: ProductIdentity::default(),
            max_tries: default_max_tries(),
            max_redirects: default_max_redirects(),
            user_debugging: false,
        }
    }
}

impl WebBrowserConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeout for browsers moving large payloads
    pub fn extended_timeout(&self) -> Duration {
        self.connection_timeout
            .saturating_mul(self.extended_timeout_multiplier)
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set proxy URL
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set product identity
    pub fn with_identity(mut self, identity: ProductIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Set default attempt count
    pub fn with_max_tries(mut self, max_tries: u8) -> Self {
        self.max_tries = max_tries;
        self
    }

    /// Set redirect budget
    pub fn with_max_redirects(mut self, max_redirects: u8) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Enable verbose request/body logging
    pub fn with_user_debugging(mut self, enabled: bool) -> Self {
        self.user_debugging = enabled;
        self
    }
}

// Default value functions for serde
fn default_connection_timeout() -> Duration {
    Duration::from_secs(90)
}

fn default_extended_timeout_multiplier() -> u32 {
    10
}

fn default_max_tries() -> u8 {
    MAX_TRIES
}

fn default_max_redirects() -> u8 {
    MAX_REDIRECTS
}
