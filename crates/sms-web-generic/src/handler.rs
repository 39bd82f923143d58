use crate::{Payload, RelayRequest};
use futures::{stream, FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use sms_core::{HttpStatus, RelayError, SendRequest, SmsClient, WebhookResponse};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, error, info, warn};

pub const SEND_METHOD: &str = "POST";
pub const SEND_PATH: &str = "/send";
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Per-recipient outcome of a dispatch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub successful: Vec<String>,
    pub failed: Vec<String>,
}

/// Authenticates a relay request and fans one SMS out per recipient.
#[derive(Clone)]
pub struct RelayHandler {
    client: Arc<dyn SmsClient>,
    auth_token: String,
    sender_id: String,
    max_concurrency: usize,
}

impl RelayHandler {
    pub fn new(client: Arc<dyn SmsClient>, auth_token: impl Into<String>) -> Self {
        Self {
            client,
            auth_token: auth_token.into(),
            sender_id: String::new(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Sender id passed to the provider with every send.
    pub fn with_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = sender_id.into();
        self
    }

    /// Maximum number of sends in flight; 1 dispatches sequentially.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Run the full request lifecycle.
    ///
    /// Never fails: staged errors map to their own responses and anything that
    /// escapes the pipeline, panics included, becomes the 400 fault response.
    pub async fn handle(&self, request: RelayRequest) -> WebhookResponse {
        debug!(method = %request.method, path = %request.path, "relay request received");

        guarded(self.process(request)).await
    }

    async fn process(&self, request: RelayRequest) -> Result<DispatchResult, RelayError> {
        validate_route(&request)?;
        let payload = parse_payload(&request)?;
        self.authenticate(&payload)?;
        let message = extract_message(&payload)?;
        let recipients = extract_recipients(&payload)?;
        debug!(recipients = recipients.len(), "payload accepted");

        Ok(self.dispatch(message, recipients).await)
    }

    fn authenticate(&self, payload: &Payload) -> Result<(), RelayError> {
        let token = payload
            .first("authToken")
            .filter(|token| !token.is_empty())
            .ok_or(RelayError::Unauthorized)?;

        if bool::from(token.as_bytes().ct_eq(self.auth_token.as_bytes())) {
            Ok(())
        } else {
            Err(RelayError::Unauthorized)
        }
    }

    /// Send `message` to every recipient, collecting outcomes by input position.
    pub async fn dispatch(&self, message: &str, recipients: &[String]) -> DispatchResult {
        let sends: Vec<_> = recipients
            .iter()
            .map(|recipient| self.send_one(recipient, message))
            .collect();
        let outcomes: Vec<bool> = stream::iter(sends)
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut result = DispatchResult::default();
        for (recipient, delivered) in recipients.iter().zip(outcomes) {
            if delivered {
                result.successful.push(recipient.clone());
            } else {
                result.failed.push(recipient.clone());
            }
        }
        result
    }

    async fn send_one(&self, recipient: &str, message: &str) -> bool {
        let request = SendRequest {
            to: recipient,
            from: &self.sender_id,
            text: message,
        };

        match AssertUnwindSafe(self.client.send(request))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => {
                info!(recipient, id = %response.id, provider = response.provider, "sms sent");
                true
            }
            Ok(Err(e)) => {
                warn!(recipient, "failed to send sms: {}", e);
                false
            }
            Err(panic) => {
                error!(recipient, "sms client panicked: {}", panic_details(panic.as_ref()));
                false
            }
        }
    }
}

/// Top-level boundary: renders the pipeline outcome and turns a panic into
/// the 400 fault response without masking staged errors.
async fn guarded<F>(pipeline: F) -> WebhookResponse
where
    F: Future<Output = Result<DispatchResult, RelayError>>,
{
    match AssertUnwindSafe(pipeline).catch_unwind().await {
        Ok(Ok(result)) => {
            info!(
                successful = result.successful.len(),
                failed = result.failed.len(),
                "relay dispatch complete"
            );
            WebhookResponse::json(HttpStatus::Ok, &result)
        }
        Ok(Err(e)) => {
            warn!(status = e.status().as_u16(), "relay request rejected: {}", e);
            e.into()
        }
        Err(panic) => {
            let details = panic_details(panic.as_ref());
            error!("relay request aborted: {}", details);
            WebhookResponse::fault(&details)
        }
    }
}

fn validate_route(request: &RelayRequest) -> Result<(), RelayError> {
    if request.method != SEND_METHOD || request.path != SEND_PATH {
        return Err(RelayError::RouteNotFound);
    }
    Ok(())
}

fn parse_payload(request: &RelayRequest) -> Result<Payload, RelayError> {
    let body = request
        .body
        .as_deref()
        .filter(|body| !body.is_empty())
        .ok_or(RelayError::InvalidBody)?;

    if let Some(content_type) = request.header("content-type") {
        debug!(content_type, "decoding request body");
    }
    Payload::decode(body)
}

fn extract_message(payload: &Payload) -> Result<&str, RelayError> {
    payload
        .first("message")
        .ok_or(RelayError::MissingField("message"))
}

fn extract_recipients(payload: &Payload) -> Result<&[String], RelayError> {
    payload
        .values("to")
        .ok_or(RelayError::MissingField("to"))
}

fn panic_details(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
