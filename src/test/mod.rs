//! Integration tests driving the full router against mocked downstream services.
//!
//! The image processor and the generation backend are both wiremock servers, so
//! every test exercises the real extraction, re-encoding, and relay paths over
//! the wire. Multipart request bodies are hand-encoded to pin the exact format
//! the gateway must accept.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request as WiremockRequest, ResponseTemplate};

use crate::Application;
use crate::config::Config;

/// Config pointing the forwarder (and optionally the chat relay) at mock servers.
fn test_config(downstream: &MockServer, chat: Option<&MockServer>) -> Config {
    let mut config = Config::default();
    config.downstream.url = downstream.uri().parse().expect("mock server URI is a valid URL");
    if let Some(backend) = chat {
        config.chat.enabled = true;
        config.chat.url = backend.uri().parse().expect("mock server URI is a valid URL");
    }
    config
}

fn test_server(config: Config) -> TestServer {
    // The reqwest clients are built with the rustls backend; tests bypass
    // main(), so the provider has to be installed here. Subsequent calls are
    // no-ops and the error is ignored.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    Application::new(config).into_test_server()
}

/// Matches when the request body contains the byte sequence, ignoring ASCII
/// case so header capitalization inside multipart bodies is not pinned.
struct BodyContains(Vec<u8>);

impl Match for BodyContains {
    fn matches(&self, request: &WiremockRequest) -> bool {
        let haystack = request.body.to_ascii_lowercase();
        let needle = self.0.to_ascii_lowercase();
        haystack.windows(needle.len()).any(|window| window == needle.as_slice())
    }
}

/// The negation of [`BodyContains`].
struct BodyLacks(Vec<u8>);

impl Match for BodyLacks {
    fn matches(&self, request: &WiremockRequest) -> bool {
        !BodyContains(self.0.clone()).matches(request)
    }
}

const BOUNDARY: &str = "gatewaytestboundary";

struct TestPart<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    content_type: Option<&'a str>,
    bytes: &'a [u8],
}

/// Hand-rolled multipart encoding: returns the content-type header value and
/// the body bytes.
fn multipart_body(parts: &[TestPart<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"", part.name).as_bytes());
        if let Some(filename) = part.filename {
            body.extend_from_slice(format!("; filename=\"{filename}\"").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

#[test_log::test(tokio::test)]
async fn healthz_is_alive() {
    let downstream = MockServer::start().await;
    let server = test_server(test_config(&downstream, None));

    let response = server.get("/healthz").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");
}

#[test_log::test(tokio::test)]
async fn multipart_first_part_is_forwarded_with_metadata() {
    let downstream = MockServer::start().await;

    let image_bytes: &[u8] = b"\x89PNG\r\nfake image payload";
    Mock::given(method("POST"))
        .and(path("/image"))
        .and(BodyContains(b"name=\"imageData\"".to_vec()))
        .and(BodyContains(b"filename=\"pikachu.png\"".to_vec()))
        .and(BodyContains(b"content-type: image/png".to_vec()))
        .and(BodyContains(image_bytes.to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_string("classified"))
        .expect(1)
        .mount(&downstream)
        .await;

    let server = test_server(test_config(&downstream, None));

    let (content_type, body) = multipart_body(&[TestPart {
        name: "upload",
        filename: Some("pikachu.png"),
        content_type: Some("image/png"),
        bytes: image_bytes,
    }]);

    let response = server.post("/image").content_type(&content_type).bytes(body.into()).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "classified");
}

#[test_log::test(tokio::test)]
async fn multipart_defaults_apply_when_metadata_is_missing() {
    let downstream = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/image"))
        .and(BodyContains(b"filename=\"image.jpg\"".to_vec()))
        .and(BodyContains(b"content-type: image/jpeg".to_vec()))
        .and(BodyContains(b"bare bytes".to_vec()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&downstream)
        .await;

    let server = test_server(test_config(&downstream, None));

    let (content_type, body) = multipart_body(&[TestPart {
        name: "upload",
        filename: None,
        content_type: None,
        bytes: b"bare bytes",
    }]);

    let response = server.post("/image").content_type(&content_type).bytes(body.into()).await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[test_log::test(tokio::test)]
async fn multipart_first_part_wins_regardless_of_field_name() {
    let downstream = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/image"))
        .and(BodyContains(b"filename=\"first.png\"".to_vec()))
        .and(BodyLacks(b"filename=\"second.png\"".to_vec()))
        .and(BodyLacks(b"second image bytes".to_vec()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&downstream)
        .await;

    let server = test_server(test_config(&downstream, None));

    let (content_type, body) = multipart_body(&[
        TestPart {
            name: "anything",
            filename: Some("first.png"),
            content_type: Some("image/png"),
            bytes: b"first image bytes",
        },
        TestPart {
            name: "imageData",
            filename: Some("second.png"),
            content_type: Some("image/png"),
            bytes: b"second image bytes",
        },
    ]);

    let response = server.post("/image").content_type(&content_type).bytes(body.into()).await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[test_log::test(tokio::test)]
async fn empty_multipart_is_rejected_without_a_downstream_call() {
    let downstream = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&downstream)
        .await;

    let server = test_server(test_config(&downstream, None));

    let (content_type, body) = multipart_body(&[]);
    let response = server.post("/image").content_type(&content_type).bytes(body.into()).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<serde_json::Value>(), json!({"error": "No file received"}));
}

#[test_log::test(tokio::test)]
async fn raw_body_is_forwarded_byte_for_byte() {
    let downstream = MockServer::start().await;

    // Not valid UTF-8, to prove the forward is byte-transparent
    let raw: &[u8] = b"\x00\xff\xfe raw image \x9f\x92\x96 bytes";
    Mock::given(method("POST"))
        .and(path("/image"))
        .and(BodyContains(b"name=\"imageData\"".to_vec()))
        .and(BodyContains(b"filename=\"image.bin\"".to_vec()))
        .and(BodyContains(b"content-type: application/octet-stream".to_vec()))
        .and(BodyContains(raw.to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&downstream)
        .await;

    let server = test_server(test_config(&downstream, None));

    let response = server
        .post("/image")
        .content_type("application/octet-stream")
        .bytes(raw.to_vec().into())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "ok");
}

#[test_log::test(tokio::test)]
async fn oversized_raw_body_never_reaches_downstream() {
    let downstream = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&downstream)
        .await;

    let mut config = test_config(&downstream, None);
    config.downstream.max_raw_bytes = 1024;
    let server = test_server(config);

    let response = server
        .post("/image")
        .content_type("application/octet-stream")
        .bytes(vec![0u8; 1025].into())
        .await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = response.json::<serde_json::Value>();
    let message = body["error"].as_str().expect("error field is a string");
    assert!(message.contains("maximum allowed size"), "got: {message}");
}

#[test_log::test(tokio::test)]
async fn downstream_response_is_relayed_verbatim() {
    let downstream = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/image"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("x-foo", "bar")
                .set_body_string("deadbeef"),
        )
        .expect(1)
        .mount(&downstream)
        .await;

    let server = test_server(test_config(&downstream, None));

    let (content_type, body) = multipart_body(&[TestPart {
        name: "upload",
        filename: Some("any.jpg"),
        content_type: Some("image/jpeg"),
        bytes: b"payload",
    }]);

    let response = server.post("/image").content_type(&content_type).bytes(body.into()).await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.header("x-foo"), "bar");
    assert_eq!(response.text(), "deadbeef");
}

#[test_log::test(tokio::test)]
async fn unreachable_downstream_is_an_internal_error() {
    let downstream = MockServer::start().await;
    let mut config = test_config(&downstream, None);
    // Port 9 (discard) is not listening; the connection is refused immediately
    config.downstream.url = "http://127.0.0.1:9/".parse().expect("valid URL");
    let server = test_server(config);

    let (content_type, body) = multipart_body(&[TestPart {
        name: "upload",
        filename: Some("any.jpg"),
        content_type: Some("image/jpeg"),
        bytes: b"payload",
    }]);

    let response = server.post("/image").content_type(&content_type).bytes(body.into()).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<serde_json::Value>(), json!({"error": "Internal error"}));
}

/// Matches the exact generate-API payload the relay is expected to send.
struct ExpectedGeneratePayload {
    question: &'static str,
}

impl Match for ExpectedGeneratePayload {
    fn matches(&self, request: &WiremockRequest) -> bool {
        let Ok(body) = serde_json::from_slice::<serde_json::Value>(&request.body) else {
            return false;
        };

        let prompt_ok = body["prompt"].as_str().is_some_and(|prompt| {
            prompt.starts_with("System: ") && prompt.ends_with(&format!("\nHuman: {}", self.question))
        });

        body["model"] == "phi3.5"
            && body["stream"] == false
            && body["options"]["temperature"].as_f64().is_some_and(|t| (t - 0.2).abs() < 1e-6)
            && prompt_ok
    }
}

#[test_log::test(tokio::test)]
async fn chat_requires_a_question() {
    let downstream = MockServer::start().await;
    let backend = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;

    let server = test_server(test_config(&downstream, Some(&backend)));

    let response = server.post("/chat").json(&json!({})).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<serde_json::Value>(), json!({"error": "question is required"}));

    let response = server.post("/chat").json(&json!({"question": ""})).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<serde_json::Value>(), json!({"error": "question is required"}));
}

#[test_log::test(tokio::test)]
async fn chat_relays_the_rendered_prompt() {
    let downstream = MockServer::start().await;
    let backend = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(ExpectedGeneratePayload {
            question: "What should I bring against Gyarados?",
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "phi3.5",
            "response": "ok",
            "done": true
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let server = test_server(test_config(&downstream, Some(&backend)));

    let response = server
        .post("/chat")
        .json(&json!({"question": "What should I bring against Gyarados?"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<serde_json::Value>(), json!({"answer": "ok"}));
}

#[test_log::test(tokio::test)]
async fn chat_backend_failure_is_an_internal_error() {
    let downstream = MockServer::start().await;
    let backend = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model blew up"))
        .expect(1)
        .mount(&backend)
        .await;

    let server = test_server(test_config(&downstream, Some(&backend)));

    let response = server.post("/chat").json(&json!({"question": "anything"})).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<serde_json::Value>(), json!({"error": "Internal error"}));
}

#[test_log::test(tokio::test)]
async fn chat_route_is_absent_when_disabled() {
    let downstream = MockServer::start().await;
    let server = test_server(test_config(&downstream, None));

    let response = server.post("/chat").json(&json!({"question": "anything"})).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
