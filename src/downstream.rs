//! Outbound half of the image gateway: the normalized upload value, the
//! multipart re-encoding the downstream expects, and the verbatim relay of
//! whatever the downstream returns.

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use url::Url;

use crate::errors::Result;

/// Multipart field name the downstream image processor expects.
pub const IMAGE_FIELD: &str = "imageData";

/// Fallback filename for multipart uploads that don't declare one.
pub const DEFAULT_FILENAME: &str = "image.jpg";
/// Fallback content type for multipart uploads that don't declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";
/// Filename used for raw octet-stream uploads, which carry no metadata.
pub const RAW_FILENAME: &str = "image.bin";
/// Content type used for raw octet-stream uploads.
pub const RAW_CONTENT_TYPE: &str = "application/octet-stream";

/// An uploaded image, normalized so the rest of the pipeline does not care
/// which wire encoding it arrived in. Filename and content type are already
/// resolved to their per-encoding fallbacks.
#[derive(Debug, Clone)]
pub struct InboundImage {
    pub bytes: Bytes,
    pub filename: String,
    pub content_type: String,
}

impl InboundImage {
    /// An image received as a raw request body. The encoding carries no
    /// metadata, so fixed values are used.
    pub fn from_raw_body(bytes: Bytes) -> Self {
        Self {
            bytes,
            filename: RAW_FILENAME.to_string(),
            content_type: RAW_CONTENT_TYPE.to_string(),
        }
    }

    /// An image received as a multipart part, with best-effort metadata.
    pub fn from_part(bytes: Bytes, filename: Option<String>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            filename: filename.unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
            content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        }
    }
}

/// The downstream's reply, relayed without reinterpretation: status code, full
/// header set, and body bytes are all copied through as-is.
#[derive(Debug)]
pub struct RelayedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for RelayedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(axum::body::Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Forwards images to the downstream processing service.
///
/// Owns the HTTP client and the downstream base URL; both come from
/// configuration so tests can point the forwarder at a mock server. No request
/// timeout is set: a hung downstream holds its request open, matching the
/// stock deployment.
#[derive(Debug, Clone)]
pub struct ImageForwarder {
    client: reqwest::Client,
    base_url: Url,
}

impl ImageForwarder {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Re-encode the image as the single-field multipart form the downstream
    /// expects and POST it to `<base>/image`, returning the response verbatim.
    pub async fn forward(&self, image: InboundImage) -> Result<RelayedResponse> {
        let url = ensure_slash(&self.base_url)
            .join("image")
            .map_err(|e| anyhow::anyhow!("failed to construct downstream URL: {e}"))?;

        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.filename)
            .mime_str(&image.content_type)
            .map_err(|e| anyhow::anyhow!("invalid content type for outbound part: {e}"))?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| anyhow::Error::new(e).context("downstream request failed"))?;

        // Status and headers are copied through their byte representations;
        // nothing is renamed or filtered.
        let status = StatusCode::from_u16(response.status().as_u16())
            .map_err(|e| anyhow::anyhow!("downstream returned invalid status: {e}"))?;

        let mut headers = HeaderMap::new();
        for (name, value) in response.headers() {
            let name = HeaderName::from_bytes(name.as_str().as_bytes())
                .map_err(|e| anyhow::anyhow!("downstream returned invalid header name: {e}"))?;
            let value = HeaderValue::from_bytes(value.as_bytes())
                .map_err(|e| anyhow::anyhow!("downstream returned invalid header value: {e}"))?;
            headers.append(name, value);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| anyhow::Error::new(e).context("failed to read downstream response body"))?;

        Ok(RelayedResponse { status, headers, body })
    }
}

/// Makes sure a url has a trailing slash before calling `Url::join`, which
/// otherwise replaces the last path segment instead of appending to it.
pub(crate) fn ensure_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        url.clone()
    } else {
        let mut new_url = url.clone();
        let mut path = new_url.path().to_string();
        path.push('/');
        new_url.set_path(&path);
        new_url
    }
}
