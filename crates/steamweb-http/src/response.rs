//! Response envelopes returned by [`crate::WebBrowser`]

use url::Url;

/// Envelope shared by every typed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicResponse {
    /// `Location` of the terminal response if it had one, otherwise the URL
    /// that was actually requested
    pub final_url: Url,
}

/// Envelope plus fully decoded content
#[derive(Debug, Clone)]
pub struct WebResponse<T> {
    pub basic: BasicResponse,
    pub content: T,
}

pub type BinaryResponse = WebResponse<Vec<u8>>;
pub type StringResponse = WebResponse<String>;
pub type ObjectResponse<T> = WebResponse<T>;
pub type XmlDocumentResponse = WebResponse<xmltree::Element>;
pub type HtmlDocumentResponse = WebResponse<scraper::Html>;

impl BasicResponse {
    pub fn new(final_url: Url) -> Self {
        Self { final_url }
    }
}

impl<T> WebResponse<T> {
    pub fn new(basic: BasicResponse, content: T) -> Self {
        Self { basic, content }
    }

    pub fn final_url(&self) -> &Url {
        &self.basic.final_url
    }

    /// Replace the content, keeping the envelope
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WebResponse<U> {
        WebResponse {
            basic: self.basic,
            content: f(self.content),
        }
    }

    pub fn into_basic(self) -> BasicResponse {
        self.basic
    }
}
