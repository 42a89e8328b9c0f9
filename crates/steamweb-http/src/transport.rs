//! Pooled transport shared by every request of one browser

use std::sync::Arc;
use std::time::Duration;

use reqwest::{cookie::Jar, Method, RequestBuilder};
use tracing::debug;
use url::Url;

use crate::{
    config::WebBrowserConfig,
    error::{HttpError, Result},
    limiter::{HostLimiter, HostPermit},
    tuning,
};

/// Owns the connection pool, cookie jar and per-host limiter
///
/// Redirects are never followed here; see [`crate::executor`].
pub struct TransportClient {
    inner: reqwest::Client,
    cookie_jar: Arc<Jar>,
    limiter: HostLimiter,
    timeout: Duration,
}

/// Per-call view of a [`TransportClient`] carrying its own timeout
#[derive(Clone, Copy)]
pub struct TransportHandle<'a> {
    client: &'a reqwest::Client,
    limiter: &'a HostLimiter,
    timeout: Duration,
}

impl TransportClient {
    /// Create a transport with configuration
    ///
    /// `extended_timeout` selects the multiplied timeout for browsers that move
    /// large payloads.
    pub fn new(config: &WebBrowserConfig, extended_timeout: bool) -> Result<Self> {
        let tuning = tuning::current();
        let cookie_jar = Arc::new(Jar::default());

        let timeout = if extended_timeout {
            config.extended_timeout()
        } else {
            config.connection_timeout
        };

        let mut builder = reqwest::Client::builder()
            .user_agent(config.identity.user_agent())
            .redirect(reqwest::redirect::Policy::none())
            .gzip(true)
            .deflate(true)
            .cookie_provider(Arc::clone(&cookie_jar))
            .pool_max_idle_per_host(tuning.max_connections_per_host)
            .pool_idle_timeout(tuning.idle_timeout)
            .timeout(timeout);

        // Configure proxy if provided
        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| HttpError::InvalidProxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let inner = builder
            .build()
            .map_err(|e| HttpError::BuildError(e.to_string()))?;

        debug!(
            "Transport ready: timeout {:?}, {} connections per host",
            timeout, tuning.max_connections_per_host
        );

        Ok(Self {
            inner,
            cookie_jar,
            limiter: HostLimiter::new(tuning.max_connections_per_host),
            timeout,
        })
    }

    /// Fresh handle sharing this transport's pool and cookies
    pub fn handle(&self) -> TransportHandle<'_> {
        self.handle_with_timeout(self.timeout)
    }

    /// Handle with a timeout different from the transport's default
    pub fn handle_with_timeout(&self, timeout: Duration) -> TransportHandle<'_> {
        TransportHandle {
            client: &self.inner,
            limiter: &self.limiter,
            timeout,
        }
    }

    /// Default per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cookie jar shared by every request of this transport
    pub fn cookie_jar(&self) -> Arc<Jar> {
        Arc::clone(&self.cookie_jar)
    }
}

impl<'a> TransportHandle<'a> {
    /// Timeout applied to requests built from this handle
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url).timeout(self.timeout)
    }

    pub(crate) async fn acquire(&self, url: &Url) -> HostPermit {
        self.limiter.acquire(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation_with_defaults() {
        let transport = TransportClient::new(&WebBrowserConfig::default(), false);
        assert!(transport.is_ok());
        assert_eq!(transport.unwrap().timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_extended_timeout() {
        let config = WebBrowserConfig::default().with_timeout(Duration::from_secs(5));
        let transport = TransportClient::new(&config, true).unwrap();
        assert_eq!(transport.timeout(), Duration::from_secs(50));
        assert_eq!(transport.handle().timeout(), Duration::from_secs(50));
    }

    #[test]
    fn test_handle_with_timeout() {
        let transport = TransportClient::new(&WebBrowserConfig::default(), false).unwrap();
        let handle = transport.handle_with_timeout(Duration::from_secs(1));
        assert_eq!(handle.timeout(), Duration::from_secs(1));
        assert_eq!(transport.timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_transport_with_proxy() {
        let config = WebBrowserConfig::default().with_proxy("http://proxy.example.com:8080");
        assert!(TransportClient::new(&config, false).is_ok());
    }

    #[test]
    fn test_invalid_proxy() {
        let config = WebBrowserConfig::default().with_proxy("http://[not-an-address");
        let result = TransportClient::new(&config, false);
        assert!(matches!(result, Err(HttpError::InvalidProxy(_))));
    }

    #[test]
    fn test_cookie_jar_is_shared() {
        let transport = TransportClient::new(&WebBrowserConfig::default(), false).unwrap();
        assert!(Arc::ptr_eq(&transport.cookie_jar(), &transport.cookie_jar()));
    }
}
