//! Drive the relay with a function URL invocation event, the way a serverless
//! trigger would. The notifier here only prints, so no AWS account is needed.

use async_trait::async_trait;
use sms_core::{SendRequest, SendResponse, SmsClient, SmsError};
use sms_web_generic::{RelayHandler, RelayRequest};
use std::sync::Arc;

/// Prints instead of sending; numbers without a leading `+` are refused.
struct ConsoleClient;

#[async_trait]
impl SmsClient for ConsoleClient {
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SmsError> {
        if !req.to.starts_with('+') {
            return Err(SmsError::Invalid(format!("not an E.164 number: {}", req.to)));
        }
        println!("-> {}: {}", req.to, req.text);
        Ok(SendResponse {
            id: sms_core::fallback_id(),
            provider: "console",
            raw: serde_json::Value::Null,
        })
    }
}

#[tokio::main]
async fn main() {
    // 1. Build the notifier and handler once, at startup
    let handler = RelayHandler::new(Arc::new(ConsoleClient), "demo-token");

    // 2. A raw event as delivered by the trigger; the body is plain form text here
    let event = serde_json::json!({
        "requestContext": { "http": { "method": "POST", "path": "/send" } },
        "headers": { "content-type": "application/x-www-form-urlencoded" },
        "body": "authToken=demo-token&message=Server+restarted&to=%2B61400000001&to=0400000002",
        "isBase64Encoded": false
    });

    // 3. Adapt, handle, and render the response for the trigger
    let response = match RelayRequest::from_function_url_event(&event) {
        Ok(request) => handler.handle(request).await,
        Err(e) => e.into(),
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&response.to_function_url_response())
            .unwrap_or_default()
    );
}
