//! HTTP adapter tests against a minimal single-request TCP fixture.

use std::io::{Read as _, Write as _};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use jsonapi_store::{
    HttpTransport, PrimaryData, RequestConfig, Resource, Transport, TransportError,
};
use serde_json::json;

/// Serve exactly one canned HTTP response and hand the raw request back
/// over a channel.
fn spawn_http_server(response: String) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            if request_complete(&raw) {
                break;
            }
        }
        let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());
        stream.write_all(response.as_bytes()).unwrap();
    });

    (format!("http://{addr}"), rx)
}

/// Headers received and, when a Content-Length is announced, the full body
/// too.
fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let length = text
        .lines()
        .find_map(|line| {
            let line = line.to_ascii_lowercase();
            let value = line.strip_prefix("content-length:")?;
            value.trim().parse::<usize>().ok()
        })
        .unwrap_or(0);
    raw.len() >= header_end + 4 + length
}

fn ok_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
}

#[tokio::test]
async fn test_get_parses_document() {
    let body = json!({
        "data": {"type": "widget", "id": "1", "attributes": {"foo": 1}}
    })
    .to_string();
    let (base_url, _rx) = spawn_http_server(ok_response(&body));

    let transport = HttpTransport::new(base_url).unwrap();
    let response = transport.get("widget/1", None).await.unwrap();
    assert_eq!(response.status, 200);
    let Some(PrimaryData::One(resource)) = response.data() else {
        panic!("expected a single resource");
    };
    assert_eq!(resource.kind, "widget");
    assert_eq!(resource.id.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_no_content_yields_no_document() {
    let (base_url, _rx) =
        spawn_http_server("HTTP/1.1 204 No Content\r\nContent-Length: 0\r\n\r\n".to_owned());

    let transport = HttpTransport::new(base_url).unwrap();
    let response = transport.delete("widget/1", None).await.unwrap();
    assert_eq!(response.status, 204);
    assert!(response.document.is_none());
}

#[tokio::test]
async fn test_error_status_captures_body() {
    let body = json!({"errors": [{"detail": "boom"}]}).to_string();
    let (base_url, _rx) = spawn_http_server(format!(
        "HTTP/1.1 500 Internal Server Error\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    ));

    let transport = HttpTransport::new(base_url).unwrap();
    let err = transport.get("widget/1", None).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    let TransportError::Status { body, .. } = err else {
        panic!("expected a status error");
    };
    assert_eq!(body.unwrap()["errors"][0]["detail"], "boom");
}

#[tokio::test]
async fn test_config_params_and_headers_applied() {
    let (base_url, rx) = spawn_http_server(ok_response("{}"));

    let transport = HttpTransport::new(base_url).unwrap();
    let config = RequestConfig::new()
        .with_param("include", "parts")
        .with_header("x-request-id", "42");
    transport.get("widget", Some(&config)).await.unwrap();

    let raw = rx.recv().unwrap();
    assert!(raw.starts_with("GET /widget?include=parts HTTP/1.1"));
    assert!(raw.to_ascii_lowercase().contains("x-request-id: 42"));
}

#[tokio::test]
async fn test_post_sends_bare_resource_body() {
    let (base_url, rx) = spawn_http_server(ok_response("{}"));

    let transport = HttpTransport::new(base_url).unwrap();
    let resource = Resource::new("widget").with_attr("foo", json!(1));
    transport.post("widget", &resource, None).await.unwrap();

    let raw = rx.recv().unwrap();
    assert!(raw.starts_with("POST /widget HTTP/1.1"));
    let body_start = raw.find("\r\n\r\n").unwrap() + 4;
    let sent: Resource = serde_json::from_str(&raw[body_start..]).unwrap();
    assert_eq!(sent, resource);
}
