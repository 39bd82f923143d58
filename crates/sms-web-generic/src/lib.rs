//! Framework-agnostic relay pipeline.
//!
//! [`RelayHandler`] takes a [`RelayRequest`] from any trigger adapter and
//! always answers with a [`WebhookResponse`]: route check, body decode,
//! token authentication, field extraction, then one send per recipient.

mod handler;
mod payload;
mod request;

pub use handler::{
    DispatchResult, RelayHandler, DEFAULT_MAX_CONCURRENCY, SEND_METHOD, SEND_PATH,
};
pub use payload::Payload;
pub use request::RelayRequest;

use sms_core::{Headers, WebhookResponse};

/// Helper trait for framework adapters to convert headers
pub trait HeaderConverter {
    type HeaderType;

    fn to_generic_headers(headers: &Self::HeaderType) -> Headers;
}

/// Helper trait for framework adapters to convert responses
pub trait ResponseConverter {
    type ResponseType;

    fn from_webhook_response(response: WebhookResponse) -> Self::ResponseType;
}
