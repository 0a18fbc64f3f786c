//! The `/image` endpoint: dual-encoding upload extraction and the downstream relay.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;

use crate::AppState;
use crate::downstream::{InboundImage, RelayedResponse};
use crate::errors::{Error, ErrorBody, Result};

/// Forward an uploaded image to the downstream processing service.
///
/// Both wire encodings land on this one route: a raw `application/octet-stream`
/// body, or `multipart/form-data` where the first part is used regardless of
/// its field name. The content type is inspected once and the request handed to
/// the matching extraction path; whatever the downstream answers is relayed
/// back unchanged.
#[utoipa::path(
    post,
    path = "/image",
    tag = "image",
    summary = "Forward an image",
    description = "Uploads an image (raw octet-stream or multipart form data) and relays the image \
                   processor's response verbatim. Raw uploads are capped (20 MiB by default); \
                   multipart uploads are not.",
    request_body(
        content_type = "multipart/form-data",
        description = "Image upload; with `application/octet-stream` the whole request body is the image"
    ),
    responses(
        (status = 200, description = "Downstream response, relayed verbatim (whatever status the downstream returns is passed through)"),
        (status = 400, description = "No file received", body = ErrorBody),
        (status = 413, description = "Raw body exceeds the size cap", body = ErrorBody),
        (status = 500, description = "Downstream unreachable or relay failure", body = ErrorBody)
    )
)]
pub async fn relay_image(State(state): State<AppState>, request: Request) -> Result<RelayedResponse> {
    let image = if is_octet_stream(&request) {
        extract_octet_stream(request, state.config.downstream.max_raw_bytes).await?
    } else {
        extract_first_part(request).await?
    };

    tracing::debug!(
        filename = %image.filename,
        content_type = %image.content_type,
        size = image.bytes.len(),
        "forwarding image downstream"
    );

    state.forwarder.forward(image).await
}

/// The raw-body discriminator: an `application/octet-stream` content type
/// selects the raw path; anything else (including no content type at all)
/// falls through to multipart handling. Media type parameters are ignored.
fn is_octet_stream(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|media_type| media_type.trim().eq_ignore_ascii_case("application/octet-stream"))
        .unwrap_or(false)
}

/// Read the whole request body as the image, subject to the raw-body cap.
/// Octet-stream uploads carry no metadata, so fixed fallbacks are used.
async fn extract_octet_stream(request: Request, max_bytes: usize) -> Result<InboundImage> {
    let bytes = axum::body::to_bytes(request.into_body(), max_bytes)
        .await
        .map_err(|_| Error::PayloadTooLarge {
            message: format!(
                "Image exceeds maximum allowed size of {} bytes ({} MB)",
                max_bytes,
                max_bytes / (1024 * 1024)
            ),
        })?;

    Ok(InboundImage::from_raw_body(bytes))
}

/// Take the first multipart part as the image, whatever its field name, using
/// its declared filename and content type when present. Zero parts is a client
/// error and nothing is sent downstream.
async fn extract_first_part(request: Request) -> Result<InboundImage> {
    let mut multipart = Multipart::from_request(request, &()).await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {}", e),
    })?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest {
            message: format!("Failed to parse multipart data: {}", e),
        })?
        .ok_or_else(|| Error::BadRequest {
            message: "No file received".to_string(),
        })?;

    let filename = field.file_name().map(|s| s.to_string());
    let content_type = field.content_type().map(|s| s.to_string());

    let bytes = field.bytes().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to read file: {}", e),
    })?;

    Ok(InboundImage::from_part(bytes, filename, content_type))
}
