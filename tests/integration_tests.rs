use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sms_relay::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const TOKEN: &str = "s3cret";

/// Succeeds for every number except those listed in `failing`.
#[derive(Default)]
struct RecordingClient {
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl RecordingClient {
    fn failing(numbers: &[&str]) -> Self {
        Self {
            failing: numbers.iter().map(|n| n.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmsClient for RecordingClient {
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SmsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(req.to) {
            return Err(SmsError::Provider(format!("rejected {}", req.to)));
        }
        Ok(SendResponse {
            id: fallback_id(),
            provider: "recording",
            raw: serde_json::json!({ "to": req.to, "text": req.text }),
        })
    }
}

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.security.auth_token = TOKEN.to_string();
    config
}

fn handler_with(client: Arc<RecordingClient>) -> RelayHandler {
    build_handler(&config(), client)
}

fn send_request(form: &str) -> RelayRequest {
    RelayRequest::new(
        "POST",
        "/send",
        vec![(
            "content-type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        )],
        Some(STANDARD.encode(form)),
    )
}

#[tokio::test]
async fn test_relay_reports_partial_failure() {
    let client = Arc::new(RecordingClient::failing(&["+61400000002"]));
    let handler = handler_with(client.clone());

    let response = handler
        .handle(send_request(
            "authToken=s3cret&message=Hello&to=%2B61400000001&to=%2B61400000002",
        ))
        .await;

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.content_type, "application/json");
    assert_eq!(
        response.body,
        r#"{"successful":["+61400000001"],"failed":["+61400000002"]}"#
    );
    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn test_relay_rejects_other_routes() {
    let client = Arc::new(RecordingClient::default());
    let handler = handler_with(client.clone());
    let body = Some(STANDARD.encode("authToken=s3cret&message=Hi&to=%2B61400000001"));

    for (method, path) in [
        ("GET", "/send"),
        ("DELETE", "/send"),
        ("POST", "/send/"),
        ("POST", "/webhooks/send"),
        ("post", "/send"),
    ] {
        let response = handler
            .handle(RelayRequest::new(method, path, vec![], body.clone()))
            .await;
        assert_eq!(response.status.as_u16(), 404, "{} {}", method, path);
        assert_eq!(response.body, "page not found");
    }
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_relay_never_sends_without_valid_token() {
    let client = Arc::new(RecordingClient::default());
    let handler = handler_with(client.clone());

    for form in [
        "message=Hi&to=%2B61400000001",
        "authToken=S3CRET&message=Hi&to=%2B61400000001",
        "authToken=s3cre&message=Hi&to=%2B61400000001",
        "authToken=wrong&authToken=s3cret&message=Hi&to=%2B61400000001",
    ] {
        let response = handler.handle(send_request(form)).await;
        assert_eq!(response.status.as_u16(), 401, "{}", form);
        assert_eq!(response.body, "unauthorized");
    }
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_relay_uses_first_token_value() {
    let client = Arc::new(RecordingClient::default());
    let handler = handler_with(client.clone());

    let response = handler
        .handle(send_request(
            "authToken=s3cret&authToken=other&message=Hi&to=%2B61400000001",
        ))
        .await;
    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_recipient_accounting_for_many_recipients() {
    let numbers: Vec<String> = (0..40).map(|i| format!("+614000{:05}", i)).collect();
    let failing: Vec<&str> = numbers.iter().step_by(3).map(String::as_str).collect();
    let client = Arc::new(RecordingClient::failing(&failing));
    let handler = handler_with(client.clone());

    let form = std::iter::once("authToken=s3cret&message=Bulk".to_string())
        .chain(numbers.iter().map(|n| format!("to={}", n.replace('+', "%2B"))))
        .collect::<Vec<_>>()
        .join("&");

    let response = handler.handle(send_request(&form)).await;
    assert_eq!(response.status.as_u16(), 200);

    let result: DispatchResult = serde_json::from_str(&response.body).unwrap();
    assert_eq!(result.successful.len() + result.failed.len(), numbers.len());

    let successful: HashSet<&String> = result.successful.iter().collect();
    assert!(result.failed.iter().all(|n| !successful.contains(n)));
    assert_eq!(result.failed, failing);

    let expected_successful: Vec<&String> = numbers
        .iter()
        .filter(|n| !failing.contains(&n.as_str()))
        .collect();
    assert_eq!(result.successful.iter().collect::<Vec<_>>(), expected_successful);
    assert_eq!(client.calls(), numbers.len());
}

#[tokio::test]
async fn test_function_url_event_round_trip() {
    let client = Arc::new(RecordingClient::default());
    let handler = handler_with(client);

    let event = serde_json::json!({
        "requestContext": { "http": { "method": "POST", "path": "/send" } },
        "headers": { "content-type": "application/x-www-form-urlencoded" },
        "body": STANDARD.encode("authToken=s3cret&message=Hi&to=%2B61400000001"),
        "isBase64Encoded": true
    });

    let request = RelayRequest::from_function_url_event(&event).unwrap();
    let rendered = handler.handle(request).await.to_function_url_response();

    assert_eq!(rendered["statusCode"], 200);
    assert_eq!(
        rendered["body"],
        r#"{"successful":["+61400000001"],"failed":[]}"#
    );
}

#[tokio::test]
async fn test_concurrent_invocations_are_independent() {
    use futures::future;

    let client = Arc::new(RecordingClient::failing(&["+61400000009"]));
    let handler = handler_with(client.clone());

    let futures = (0..10).map(|i| {
        let handler = handler.clone();
        let form = format!(
            "authToken=s3cret&message=Hello+{}&to=%2B6140000000{}&to=%2B61400000009",
            i,
            i % 9
        );
        async move { handler.handle(send_request(&form)).await }
    });

    let responses = future::join_all(futures).await;

    assert_eq!(responses.len(), 10);
    for (i, response) in responses.into_iter().enumerate() {
        assert_eq!(response.status.as_u16(), 200);
        let result: DispatchResult = serde_json::from_str(&response.body).unwrap();
        assert_eq!(result.successful, [format!("+6140000000{}", i % 9)]);
        assert_eq!(result.failed, ["+61400000009"]);
    }
    assert_eq!(client.calls(), 20);
}

#[tokio::test]
async fn test_axum_router_end_to_end() {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use sms_web_axum::{router, AppState};
    use tower::ServiceExt;

    let client = Arc::new(RecordingClient::default());
    let config = config();
    let state = AppState {
        handler: Arc::new(build_handler(&config, client.clone())),
    };
    let app = router(state, config.security.max_body_size);

    let request = Request::builder()
        .method("POST")
        .uri("/send")
        .body(Body::from("authToken=nope&message=Hi&to=%2B61400000001"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"unauthorized");
    assert_eq!(client.calls(), 0);
}
