//! Retrying web client for Steam and friends
//!
//! Sits on top of `reqwest` and adds what it hides or does differently:
//!
//! ## Features
//!
//! - **Bounded retries**: every operation is attempted up to `max_tries` times
//! - **Manual redirects**: `steammobile://` targets are returned, fragments are
//!   inherited, POST turns into GET where RFC 7231 says so
//! - **Typed responses**: bytes (with progress), text, JSON, XML and HTML
//! - **Never throws**: operations return `Option`, failures are logged
//! - **Shared state**: one connection pool and cookie jar per browser
//!
//! ```no_run
//! use steamweb_http::{TransportTuning, WebBrowser, WebBrowserConfig};
//!
//! # async fn run() -> steamweb_http::Result<()> {
//! steamweb_http::init(TransportTuning::default())?;
//!
//! let browser = WebBrowser::new(WebBrowserConfig::default())?;
//! if let Some(page) = browser
//!     .get_to_html("https://steamcommunity.com/", None, None)
//!     .await
//! {
//!     println!("loaded {}", page.final_url());
//! }
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod decode;
pub mod error;
pub mod executor;
mod limiter;
pub mod response;
pub mod retry;
pub mod transport;
pub mod tuning;

pub use browser::{FormData, WebBrowser};
pub use config::{ProductIdentity, WebBrowserConfig, MAX_REDIRECTS, MAX_TRIES};
pub use decode::string_to_html_document;
pub use error::{HttpError, Result};
pub use executor::{ReadMode, RequestDescriptor, RequestExecutor, STEAM_MOBILE_SCHEME};
pub use response::{
    BasicResponse, BinaryResponse, HtmlDocumentResponse, ObjectResponse, StringResponse,
    WebResponse, XmlDocumentResponse,
};
pub use retry::{RetryConfig, RetryController};
pub use transport::{TransportClient, TransportHandle};
pub use tuning::{init, TransportTuning};

/// Re-export commonly used types
pub use reqwest::{cookie::Jar, header, Method, StatusCode};
