//! Response decoders
//!
//! Every decoder consumes an [`ExecutedResponse`] and either returns fully
//! populated content or an error. Nothing partial is ever handed out.

use bytes::Bytes;
use futures::{pin_mut, Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::{
    error::{HttpError, Result},
    executor::ExecutedResponse,
    response::{
        BasicResponse, BinaryResponse, HtmlDocumentResponse, ObjectResponse, StringResponse,
        XmlDocumentResponse,
    },
};

/// Bytes consumed from the body per read
pub const CHUNK_SIZE: usize = 8192;

/// Progress is reported every this many percent of the declared length
pub const PROGRESS_STEP: u8 = 10;

const MAX_PROGRESS_BATCHES: u8 = 99 / PROGRESS_STEP;

// Declared lengths are untrusted; never reserve more than this up front.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Stream the whole body, reporting progress
pub async fn to_bytes(
    response: ExecutedResponse,
    on_progress: impl FnMut(u8),
) -> Result<BinaryResponse> {
    let ExecutedResponse {
        basic,
        inner,
        permit: _permit,
    } = response;

    let content_length = inner.content_length();
    let content = read_to_bytes(inner.bytes_stream(), content_length, on_progress).await?;

    Ok(BinaryResponse::new(basic, content))
}

/// Collect `stream` into memory
///
/// `on_progress` receives 0, then one call per 10% of `content_length`
/// (none when the length is unknown or zero), then 100 once the stream ends.
/// On a stream error the partial buffer is dropped.
pub async fn read_to_bytes<S, E>(
    stream: S,
    content_length: Option<u64>,
    mut on_progress: impl FnMut(u8),
) -> Result<Vec<u8>>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<HttpError>,
{
    pin_mut!(stream);

    let length = content_length.unwrap_or(0);
    let step = length / u64::from(PROGRESS_STEP);
    let capacity = usize::try_from(length.min(MAX_PREALLOCATION)).unwrap_or(0);

    let mut buffer = Vec::with_capacity(capacity);
    let mut batch: u8 = 0;
    let mut read_this_batch: u64 = 0;

    on_progress(0);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::into)?;

        for piece in chunk.chunks(CHUNK_SIZE) {
            buffer.extend_from_slice(piece);

            if length == 0 || batch >= MAX_PROGRESS_BATCHES {
                continue;
            }

            read_this_batch += piece.len() as u64;
            if read_this_batch < step {
                continue;
            }

            read_this_batch -= step;
            batch += 1;
            on_progress(batch * PROGRESS_STEP);
        }
    }

    on_progress(100);

    Ok(buffer)
}

/// Decode the full body as text
pub async fn to_string(response: ExecutedResponse) -> Result<StringResponse> {
    let ExecutedResponse {
        basic,
        inner,
        permit: _permit,
    } = response;

    let content = inner.text().await?;

    Ok(StringResponse::new(basic, content))
}

/// Parse a received text body as JSON
pub fn to_json<T: DeserializeOwned>(response: &StringResponse) -> Result<ObjectResponse<T>> {
    if response.content.is_empty() {
        return Err(HttpError::EmptyBody);
    }

    let content = serde_json::from_str(&response.content)?;

    Ok(ObjectResponse::new(response.basic.clone(), content))
}

/// Parse a received text body as an XML document
pub fn to_xml(response: &StringResponse) -> Result<XmlDocumentResponse> {
    if response.content.is_empty() {
        return Err(HttpError::EmptyBody);
    }

    let content = xmltree::Element::parse(response.content.as_bytes())?;

    Ok(XmlDocumentResponse::new(response.basic.clone(), content))
}

/// Parse a received text body as HTML. Never fails.
pub fn to_html(response: StringResponse) -> HtmlDocumentResponse {
    response.map(|content| string_to_html_document(&content))
}

/// Tolerant HTML parse; garbage or empty input yields a best-effort tree
pub fn string_to_html_document(html: &str) -> scraper::Html {
    scraper::Html::parse_document(html)
}

/// Keep only the envelope of a response, releasing its body
pub fn to_basic(response: ExecutedResponse) -> BasicResponse {
    response.into_basic()
}
