use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use sms_core::{Headers, RelayError};

/// Inbound request as handed over by a trigger adapter.
///
/// `body` holds the base64 text of the raw request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    pub method: String,
    pub path: String,
    pub headers: Headers,
    pub body: Option<String>,
}

impl RelayRequest {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        headers: Headers,
        body: Option<String>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers,
            body,
        }
    }

    /// Build a request from an unencoded body, as received by an HTTP server.
    pub fn from_raw_body(
        method: impl Into<String>,
        path: impl Into<String>,
        headers: Headers,
        body: &[u8],
    ) -> Self {
        let body = (!body.is_empty()).then(|| STANDARD.encode(body));
        Self::new(method, path, headers, body)
    }

    /// Build a request from a function URL invocation event.
    ///
    /// `requestContext.http` is mandatory; its absence is reported as an
    /// unexpected fault.
    pub fn from_function_url_event(event: &Value) -> Result<Self, RelayError> {
        let http = event
            .get("requestContext")
            .and_then(|ctx| ctx.get("http"))
            .ok_or_else(|| RelayError::Unexpected("missing key: requestContext.http".into()))?;

        let method = http
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| RelayError::Unexpected("missing key: requestContext.http.method".into()))?;
        let path = http
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| RelayError::Unexpected("missing key: requestContext.http.path".into()))?;

        let headers: Headers = event
            .get("headers")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let base64_encoded = event
            .get("isBase64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let body = event.get("body").and_then(Value::as_str);

        Ok(match (body, base64_encoded) {
            (Some(text), false) => Self::from_raw_body(method, path, headers, text.as_bytes()),
            (body, _) => Self::new(method, path, headers, body.map(str::to_string)),
        })
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
