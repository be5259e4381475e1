// HttpBackend against a one-shot local HTTP stub
//
// Each stub accepts a single connection, captures the raw request and
// answers with a canned status line and body.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use checkon::api::{AuthToken, Backend, HttpBackend, RecommendationRequest};
use checkon::trip::{Purpose, TransportMode, TripAttributes};
use checkon::CheckOnError;

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let read = socket.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        let text = String::from_utf8_lossy(&buffer).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buffer).to_string()
}

async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });
    (format!("http://{}", address), server)
}

fn backend(base_url: &str) -> HttpBackend {
    HttpBackend::new(base_url, Duration::from_secs(5)).unwrap()
}

fn business_trip() -> RecommendationRequest {
    RecommendationRequest::new(TripAttributes {
        purpose: Some(Purpose::Business),
        transport_mode: Some(TransportMode::RentalCar),
        minimal_packing: Some(false),
        needs_currency_exchange: Some(true),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_list_cities() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"[{"cityId": 1, "cityName": "Tokyo"}, {"cityId": 2, "cityName": "Paris"}]"#,
    )
    .await;

    let cities = backend(&base_url).list_cities().await.unwrap();
    assert_eq!(cities.len(), 2);
    assert_eq!(cities[1].city_name, "Paris");

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /cities HTTP/1.1"));
}

#[tokio::test]
async fn test_recommend_sends_attributes_and_token() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"[{"itemId": 2, "itemLabel": "suit", "categoryLabel": "clothing"},
            {"itemLabel": "tie", "categoryLabel": "clothing"}]"#,
    )
    .await;

    let token = AuthToken::new("jwt-value").unwrap();
    let items = backend(&base_url)
        .recommend(&business_trip(), Some(&token))
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].item_id, Some(2));
    assert_eq!(items[1].item_id, None);

    let request = server.await.unwrap();
    let lowered = request.to_lowercase();
    assert!(request.starts_with("POST /recommendations HTTP/1.1"));
    assert!(lowered.contains("authorization: bearer jwt-value"));
    assert!(request.contains(r#""purpose":"business""#));
    assert!(request.contains(r#""transportMode":"rental-car""#));
}

#[tokio::test]
async fn test_recommend_without_token_sends_no_authorization() {
    let (base_url, server) = serve_once("200 OK", "[]").await;

    let items = backend(&base_url)
        .recommend(&business_trip(), None)
        .await
        .unwrap();
    assert!(items.is_empty());

    let request = server.await.unwrap();
    assert!(!request.to_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn test_client_error_surfaces_message() {
    let (base_url, server) = serve_once(
        "400 Bad Request",
        r#"{"message": "title must be at least 2 characters"}"#,
    )
    .await;

    let result = backend(&base_url).list_catalog().await;
    server.await.unwrap();
    match result {
        Err(error @ CheckOnError::Server { status: 400, .. }) => {
            assert!(!error.is_retryable());
            assert_eq!(error.user_message(), "title must be at least 2 characters");
        }
        other => panic!("Expected a 400 server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let (base_url, server) = serve_once("503 Service Unavailable", "down for maintenance").await;

    let result = backend(&base_url).list_cities().await;
    server.await.unwrap();
    match result {
        Err(error @ CheckOnError::Server { status: 503, .. }) => {
            assert!(error.is_retryable());
            assert_eq!(error.user_message(), "down for maintenance");
        }
        other => panic!("Expected a 503 server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_body_is_rejected() {
    let (base_url, server) = serve_once("200 OK", "<html>hello</html>").await;

    let result = backend(&base_url).list_cities().await;
    server.await.unwrap();
    assert!(matches!(result, Err(CheckOnError::InvalidResponse { .. })));
}

#[tokio::test]
async fn test_wrapped_payload_is_rejected() {
    // Only a bare array is accepted, never a payload nested under a key
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"data": [{"itemId": 2, "itemLabel": "suit", "categoryLabel": "clothing"}]}"#,
    )
    .await;

    let result = backend(&base_url).recommend(&business_trip(), None).await;
    server.await.unwrap();
    assert!(matches!(result, Err(CheckOnError::InvalidResponse { .. })));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let result = backend(&format!("http://{}", address)).list_cities().await;
    match result {
        Err(error @ CheckOnError::Transport { .. }) => assert!(error.is_retryable()),
        other => panic!("Expected a transport error, got {:?}", other),
    }
}
