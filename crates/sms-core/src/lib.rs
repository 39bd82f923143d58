//! # SMS Core
//!
//! Core traits and types shared by the sms-relay webhook and its providers.
//!
//! This crate provides the fundamental building blocks:
//! - [`SmsClient`] trait for sending a single SMS (the relay's notifier)
//! - [`RelayError`] taxonomy for the request pipeline
//! - [`WebhookResponse`], a framework-independent HTTP response
//!
//! ## Example
//!
//! ```rust,ignore
//! use sms_core::{SendRequest, SmsClient};
//!
//! // Any SMS provider implements SmsClient
//! let response = client.send(SendRequest {
//!     to: "+61400000001",
//!     from: "",
//!     text: "Hello world!"
//! }).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during SMS operations
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// Request never got a response (dispatch failure or timeout)
    #[error("http error: {0}")]
    Http(String),
    /// Authentication/authorization error
    #[error("authentication error: {0}")]
    Auth(String),
    /// Invalid request parameters
    #[error("invalid request: {0}")]
    Invalid(String),
    /// SMS provider returned an error
    #[error("provider error: {0}")]
    Provider(String),
}

/// Request-level failures of the relay pipeline.
///
/// Each variant is terminal: the pipeline stops at the first one and turns it
/// into a [`WebhookResponse`]. Per-recipient send failures are not part of this
/// taxonomy; they are reported in-band.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("page not found")]
    RouteNotFound,
    #[error("invalid body")]
    InvalidBody,
    #[error("{0}")]
    Decode(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("missing: {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    Unexpected(String),
}

impl RelayError {
    pub fn status(&self) -> HttpStatus {
        match self {
            RelayError::RouteNotFound => HttpStatus::NotFound,
            RelayError::Unauthorized => HttpStatus::Unauthorized,
            RelayError::InvalidBody
            | RelayError::Decode(_)
            | RelayError::MissingField(_)
            | RelayError::Unexpected(_) => HttpStatus::BadRequest,
        }
    }
}

/// HTTP status code for web responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    BadRequest = 400,
    Unauthorized = 401,
    NotFound = 404,
}

impl HttpStatus {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest<'a> {
    pub to: &'a str,
    pub from: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub id: String,
    /// Name of the backend/provider that produced the response, e.g. "aws-sns".
    pub provider: &'static str,
    /// Raw provider payload for debugging / audit.
    pub raw: serde_json::Value,
}

/// Generic webhook response that can be converted to any framework's response type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: HttpStatus,
    pub body: String,
    pub content_type: String,
}

impl WebhookResponse {
    /// Plain-text response, used by the staged validation errors.
    pub fn text(status: HttpStatus, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: CONTENT_TYPE_TEXT.to_string(),
        }
    }

    pub fn json<T: Serialize>(status: HttpStatus, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                body,
                content_type: CONTENT_TYPE_JSON.to_string(),
            },
            Err(e) => Self::fault(&format!("failed to serialize response: {}", e)),
        }
    }

    /// Last-resort 400 carrying the fault details in a JSON `message` field.
    pub fn fault(details: &str) -> Self {
        let body = serde_json::json!({
            "message": format!("an error has occurred. {}", details),
        });
        Self {
            status: HttpStatus::BadRequest,
            body: body.to_string(),
            content_type: CONTENT_TYPE_JSON.to_string(),
        }
    }

    /// Render the response in the shape expected by a function URL trigger.
    pub fn to_function_url_response(&self) -> serde_json::Value {
        serde_json::json!({
            "statusCode": self.status.as_u16(),
            "headers": { "content-type": self.content_type },
            "body": self.body,
        })
    }
}

impl From<RelayError> for WebhookResponse {
    fn from(error: RelayError) -> Self {
        match error {
            RelayError::Decode(details) | RelayError::Unexpected(details) => {
                WebhookResponse::fault(&details)
            }
            e => WebhookResponse::text(e.status(), e.to_string()),
        }
    }
}

#[async_trait]
pub trait SmsClient: Send + Sync {
    /// Send a single text SMS.
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SmsError>;
}

/// Utility to create a pseudo id if a provider doesn't return one.
pub fn fallback_id() -> String {
    Uuid::new_v4().to_string()
}

/// Lightweight header representation to avoid tying the core to any HTTP framework.
pub type Headers = Vec<(String, String)>;
