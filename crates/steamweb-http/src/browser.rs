//! Public request operations
//!
//! Every operation returns `Option`: `None` after all attempts failed, never
//! an error. Failure reasons are logged through `tracing`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{cookie::Jar, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    config::WebBrowserConfig,
    decode,
    error::{HttpError, Result},
    executor::{ExecutedResponse, ReadMode, RequestDescriptor, RequestExecutor},
    response::{
        BasicResponse, BinaryResponse, HtmlDocumentResponse, ObjectResponse, StringResponse,
        XmlDocumentResponse,
    },
    retry::{RetryConfig, RetryController},
    transport::TransportClient,
};

/// Form fields sent as `application/x-www-form-urlencoded`
pub type FormData<'a> = &'a [(&'a str, &'a str)];

/// Retrying HTTP client with typed responses
///
/// Owns its connection pool and cookie jar; both are released when the
/// browser is dropped.
pub struct WebBrowser {
    config: WebBrowserConfig,
    transport: TransportClient,
    retry: RetryController,
}

impl WebBrowser {
    /// Create a new browser with configuration
    pub fn new(config: WebBrowserConfig) -> Result<Self> {
        Self::build(config, false)
    }

    /// Browser for large payloads, using the extended timeout
    pub fn with_extended_timeout(config: WebBrowserConfig) -> Result<Self> {
        Self::build(config, true)
    }

    /// Create browser with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(WebBrowserConfig::default())
    }

    fn build(config: WebBrowserConfig, extended_timeout: bool) -> Result<Self> {
        let transport = TransportClient::new(&config, extended_timeout)?;
        let retry = RetryController::new(RetryConfig {
            max_tries: config.max_tries,
        });

        Ok(Self {
            config,
            transport,
            retry,
        })
    }

    /// Release the connection pool and cookie jar now
    pub fn dispose(self) {
        debug!("Disposing web browser");
    }

    pub fn config(&self) -> &WebBrowserConfig {
        &self.config
    }

    /// Timeout applied to every request of this browser
    pub fn timeout(&self) -> Duration {
        self.transport.timeout()
    }

    pub fn cookie_jar(&self) -> Arc<Jar> {
        self.transport.cookie_jar()
    }

    pub fn transport(&self) -> &TransportClient {
        &self.transport
    }

    /// GET the body as bytes, logging download progress
    pub async fn get_to_bytes(
        &self,
        url: &str,
        referer: Option<&str>,
        max_tries: Option<u8>,
    ) -> Option<BinaryResponse> {
        self.get_to_bytes_with_progress(url, referer, max_tries, |percent| {
            debug!("{percent}%...")
        })
        .await
    }

    /// GET the body as bytes, reporting progress in percent
    pub async fn get_to_bytes_with_progress(
        &self,
        url: &str,
        referer: Option<&str>,
        max_tries: Option<u8>,
        on_progress: impl Fn(u8),
    ) -> Option<BinaryResponse> {
        let on_progress = &on_progress;
        self.run(
            Method::GET,
            url,
            None,
            referer,
            max_tries,
            ReadMode::HeadersFirst,
            |response| decode::to_bytes(response, on_progress),
        )
        .await
    }

    pub async fn get_to_string(
        &self,
        url: &str,
        referer: Option<&str>,
        max_tries: Option<u8>,
    ) -> Option<StringResponse> {
        self.run(
            Method::GET,
            url,
            None,
            referer,
            max_tries,
            ReadMode::Buffered,
            decode::to_string,
        )
        .await
    }

    pub async fn get_to_html(
        &self,
        url: &str,
        referer: Option<&str>,
        max_tries: Option<u8>,
    ) -> Option<HtmlDocumentResponse> {
        self.get_to_string(url, referer, max_tries)
            .await
            .map(decode::to_html)
    }

    pub async fn get_to_json<T: DeserializeOwned>(
        &self,
        url: &str,
        referer: Option<&str>,
        max_tries: Option<u8>,
    ) -> Option<ObjectResponse<T>> {
        self.run(
            Method::GET,
            url,
            None,
            referer,
            max_tries,
            ReadMode::Buffered,
            |response| self.decode_json(response),
        )
        .await
    }

    pub async fn get_to_xml(
        &self,
        url: &str,
        referer: Option<&str>,
        max_tries: Option<u8>,
    ) -> Option<XmlDocumentResponse> {
        self.run(
            Method::GET,
            url,
            None,
            referer,
            max_tries,
            ReadMode::Buffered,
            |response| self.decode_xml(response),
        )
        .await
    }

    pub async fn head(
        &self,
        url: &str,
        referer: Option<&str>,
        max_tries: Option<u8>,
    ) -> Option<BasicResponse> {
        self.run(
            Method::HEAD,
            url,
            None,
            referer,
            max_tries,
            ReadMode::Buffered,
            |response| async move { Ok(decode::to_basic(response)) },
        )
        .await
    }

    /// POST and keep only the envelope
    pub async fn post(
        &self,
        url: &str,
        data: Option<FormData<'_>>,
        referer: Option<&str>,
        max_tries: Option<u8>,
    ) -> Option<BasicResponse> {
        self.run(
            Method::POST,
            url,
            data,
            referer,
            max_tries,
            ReadMode::HeadersFirst,
            |response| async move { Ok(decode::to_basic(response)) },
        )
        .await
    }

    pub async fn post_to_string(
        &self,
        url: &str,
        data: Option<FormData<'_>>,
        referer: Option<&str>,
        max_tries: Option<u8>,
    ) -> Option<StringResponse> {
        self.run(
            Method::POST,
            url,
            data,
            referer,
            max_tries,
            ReadMode::Buffered,
            decode::to_string,
        )
        .await
    }

    pub async fn post_to_html(
        &self,
        url: &str,
        data: Option<FormData<'_>>,
        referer: Option<&str>,
        max_tries: Option<u8>,
    ) -> Option<HtmlDocumentResponse> {
        self.post_to_string(url, data, referer, max_tries)
            .await
            .map(decode::to_html)
    }

    pub async fn post_to_json<T: DeserializeOwned>(
        &self,
        url: &str,
        data: Option<FormData<'_>>,
        referer: Option<&str>,
        max_tries: Option<u8>,
    ) -> Option<ObjectResponse<T>> {
        self.run(
            Method::POST,
            url,
            data,
            referer,
            max_tries,
            ReadMode::Buffered,
            |response| self.decode_json(response),
        )
        .await
    }

    /// One retry loop of send + decode
    #[allow(clippy::too_many_arguments)]
    async fn run<T, D, Fut>(
        &self,
        method: Method,
        url: &str,
        data: Option<FormData<'_>>,
        referer: Option<&str>,
        max_tries: Option<u8>,
        read_mode: ReadMode,
        decode: D,
    ) -> Option<T>
    where
        D: Fn(ExecutedResponse) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let decode = &decode;
        self.retry
            .execute(max_tries, url, || {
                let method = method.clone();
                async move {
                    let response = self.send(method, url, data, referer, read_mode).await?;
                    decode(response).await
                }
            })
            .await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        data: Option<FormData<'_>>,
        referer: Option<&str>,
        read_mode: ReadMode,
    ) -> Result<ExecutedResponse> {
        let mut request = RequestDescriptor::new(method, url)?
            .with_read_mode(read_mode)
            .with_max_redirects(self.config.max_redirects);
        if let Some(data) = data {
            request = request.with_form(data)?;
        }
        if let Some(referer) = referer {
            request = request.with_referer(referer)?;
        }

        RequestExecutor::new(self.transport.handle())
            .with_user_debugging(self.config.user_debugging)
            .execute(request)
            .await
    }

    async fn decode_json<T: DeserializeOwned>(
        &self,
        response: ExecutedResponse,
    ) -> Result<ObjectResponse<T>> {
        let text = decode::to_string(response).await?;
        decode::to_json(&text).map_err(|e| {
            self.log_undecodable(&text, &e);
            e
        })
    }

    async fn decode_xml(&self, response: ExecutedResponse) -> Result<XmlDocumentResponse> {
        let text = decode::to_string(response).await?;
        decode::to_xml(&text).map_err(|e| {
            self.log_undecodable(&text, &e);
            e
        })
    }

    fn log_undecodable(&self, text: &StringResponse, error: &HttpError) {
        warn!("Failed to decode response from {}: {error}", text.final_url());
        if self.config.user_debugging {
            debug!("Content: {}", text.content);
        }
    }
}
