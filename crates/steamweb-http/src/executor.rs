//! Request execution with manual redirect resolution
//!
//! The transport never follows redirects on its own. The executor does it
//! instead so that it can:
//!
//! - hand `steammobile://` redirects back to the caller untouched
//! - carry the original fragment over to redirect targets (RFC 7231 §7.1.2)
//! - turn POST into GET for 300/301/302/303
//!
//! One call to [`RequestExecutor::execute`] is one logical request. It follows
//! at most `max_redirects` hops and never retries; see [`crate::retry`].

use reqwest::{
    header::{HeaderMap, CONTENT_TYPE, LOCATION, REFERER},
    Method, StatusCode,
};
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::MAX_REDIRECTS,
    error::{HttpError, Result},
    limiter::HostPermit,
    response::BasicResponse,
    transport::TransportHandle,
};

/// Application scheme whose redirects are returned instead of followed
pub const STEAM_MOBILE_SCHEME: &str = "steammobile";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// How much of the response is read before the executor returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Read the whole body; body read errors fail the request
    #[default]
    Buffered,
    /// Return as soon as headers arrive; the body is streamed by the caller
    HeadersFirst,
}

/// One logical request, built fresh for every attempt
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: Url,
    pub method: Method,
    /// URL-encoded form body
    pub form: Option<String>,
    pub referer: Option<Url>,
    pub read_mode: ReadMode,
    /// Redirect hops still allowed
    pub max_redirects: u8,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))?;

        Ok(Self {
            url,
            method,
            form: None,
            referer: None,
            read_mode: ReadMode::default(),
            max_redirects: MAX_REDIRECTS,
        })
    }

    /// Encode `data` as the `application/x-www-form-urlencoded` body
    pub fn with_form(mut self, data: &[(&str, &str)]) -> Result<Self> {
        let encoded =
            serde_urlencoded::to_string(data).map_err(|e| HttpError::InvalidForm(e.to_string()))?;
        self.form = Some(encoded);
        Ok(self)
    }

    pub fn with_referer(mut self, referer: &str) -> Result<Self> {
        let referer = Url::parse(referer)
            .map_err(|e| HttpError::InvalidReferer(format!("{referer}: {e}")))?;
        self.referer = Some(referer);
        Ok(self)
    }

    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: u8) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}

/// Response of a successful [`RequestExecutor::execute`]
///
/// Holds the per-host connection permit until the body has been consumed or
/// the response is dropped.
#[derive(Debug)]
pub struct ExecutedResponse {
    pub(crate) basic: BasicResponse,
    pub(crate) inner: reqwest::Response,
    pub(crate) permit: HostPermit,
}

impl ExecutedResponse {
    pub fn basic(&self) -> &BasicResponse {
        &self.basic
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.inner.content_length()
    }

    pub fn into_basic(self) -> BasicResponse {
        self.basic
    }
}

/// Sends requests through one transport handle
pub struct RequestExecutor<'a> {
    transport: TransportHandle<'a>,
    user_debugging: bool,
}

impl<'a> RequestExecutor<'a> {
    pub fn new(transport: TransportHandle<'a>) -> Self {
        Self {
            transport,
            user_debugging: false,
        }
    }

    /// Log raw bodies of failed responses
    pub fn with_user_debugging(mut self, enabled: bool) -> Self {
        self.user_debugging = enabled;
        self
    }

    /// Send `request`, following redirects until a terminal response
    pub async fn execute(&self, request: RequestDescriptor) -> Result<ExecutedResponse> {
        let RequestDescriptor {
            mut url,
            mut method,
            mut form,
            referer,
            read_mode,
            max_redirects,
        } = request;
        let mut remaining = max_redirects;

        loop {
            let permit = self.transport.acquire(&url).await;

            let mut builder = self.transport.request(method.clone(), url.clone());
            if let Some(body) = &form {
                builder = builder
                    .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                    .body(body.clone());
            }
            if let Some(referer) = &referer {
                builder = builder.header(REFERER, referer.as_str());
            }

            debug!("{method} {url}");
            let response = builder.send().await.map_err(|e| {
                debug!("{method} {url} failed: {e}");
                HttpError::RequestFailed(e)
            })?;

            let status = response.status();
            debug!("{status} <- {method} {url}");

            if status.is_success() {
                let basic = BasicResponse::new(final_url(&url, response.headers()));
                return finish(basic, response, read_mode, permit).await;
            }

            if !status.is_redirection() {
                self.log_body(response).await;
                return Err(HttpError::HttpStatus {
                    status,
                    message: status.canonical_reason().unwrap_or("Unknown").to_string(),
                });
            }

            if remaining == 0 {
                self.log_body(response).await;
                return Err(HttpError::RedirectBudgetExhausted {
                    status,
                    url: url.to_string(),
                });
            }

            let Some(target) = location(response.headers())
                .and_then(|location| resolve_location(&url, location).ok())
            else {
                warn!("{status} <- {method} {url} has no usable Location header");
                return Err(HttpError::MissingLocation { status });
            };

            if target.scheme() == STEAM_MOBILE_SCHEME {
                return finish(BasicResponse::new(target), response, read_mode, permit).await;
            }
            if !matches!(target.scheme(), "http" | "https") {
                warn!(
                    "Unknown redirect scheme {} in {target}, following anyway",
                    target.scheme()
                );
            }

            let target = inherit_fragment(&url, target);

            if method == Method::POST && downgrades_post(status) {
                method = Method::GET;
                form = None;
            }

            drop(response);
            drop(permit);

            url = target;
            remaining -= 1;
        }
    }

    async fn log_body(&self, response: reqwest::Response) {
        if !self.user_debugging {
            return;
        }

        match response.text().await {
            Ok(body) => debug!("Content: {body}"),
            Err(e) => debug!("Failed to read response body: {e}"),
        }
    }
}

async fn finish(
    basic: BasicResponse,
    response: reqwest::Response,
    read_mode: ReadMode,
    permit: HostPermit,
) -> Result<ExecutedResponse> {
    let inner = match read_mode {
        ReadMode::Buffered => buffer(response).await?,
        ReadMode::HeadersFirst => response,
    };

    Ok(ExecutedResponse {
        basic,
        inner,
        permit,
    })
}

/// Read the full body and wrap it back into a response with the same head
async fn buffer(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    let version = response.version();
    let headers = response.headers().clone();
    let body = response.bytes().await?;

    let mut buffered = http::Response::new(body);
    *buffered.status_mut() = status;
    *buffered.version_mut() = version;
    *buffered.headers_mut() = headers;

    Ok(reqwest::Response::from(buffered))
}

fn location(headers: &HeaderMap) -> Option<&str> {
    headers.get(LOCATION)?.to_str().ok()
}

/// Absolute locations are taken as-is, relative ones resolve against `base`
pub fn resolve_location(base: &Url, location: &str) -> std::result::Result<Url, url::ParseError> {
    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base.join(location),
        Err(e) => Err(e),
    }
}

/// Copy the fragment of `original` onto `target` unless `target` has its own
pub fn inherit_fragment(original: &Url, mut target: Url) -> Url {
    let Some(fragment) = original.fragment().filter(|fragment| !fragment.is_empty()) else {
        return target;
    };

    if target.fragment().map_or(true, str::is_empty) {
        target.set_fragment(Some(fragment));
    }

    target
}

/// Statuses for which a POST must be repeated as a GET
pub fn downgrades_post(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MULTIPLE_CHOICES
            | StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
    )
}

fn final_url(request_url: &Url, headers: &HeaderMap) -> Url {
    location(headers)
        .and_then(|location| resolve_location(request_url, location).ok())
        .unwrap_or_else(|| request_url.clone())
}
