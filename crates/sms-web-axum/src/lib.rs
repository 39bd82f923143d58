use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use bytes::Bytes;
use sms_core::{Headers, WebhookResponse};
use sms_web_generic::{HeaderConverter, RelayHandler, RelayRequest, ResponseConverter};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<RelayHandler>,
}

/// Axum-specific header converter
pub struct AxumHeaderConverter;

impl HeaderConverter for AxumHeaderConverter {
    type HeaderType = HeaderMap;

    fn to_generic_headers(headers: &Self::HeaderType) -> Headers {
        headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }
}

/// Axum-specific response converter
pub struct AxumResponseConverter;

impl ResponseConverter for AxumResponseConverter {
    type ResponseType = axum::response::Response;

    fn from_webhook_response(response: WebhookResponse) -> Self::ResponseType {
        let status = StatusCode::from_u16(response.status.as_u16())
            .unwrap_or(StatusCode::BAD_REQUEST);

        (
            status,
            [(header::CONTENT_TYPE, response.content_type)],
            response.body,
        )
            .into_response()
    }
}

/// Catch-all handler: every method and path is handed to the relay, which
/// owns the `POST /send` route decision.
pub async fn relay_endpoint(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let request = RelayRequest::from_raw_body(
        method.as_str(),
        uri.path(),
        AxumHeaderConverter::to_generic_headers(&headers),
        &body,
    );
    tracing::debug!(method = %method, path = uri.path(), "forwarding request to relay");

    let response = state.handler.handle(request).await;
    AxumResponseConverter::from_webhook_response(response)
}

pub fn router(state: AppState, max_body_size: usize) -> Router {
    Router::new()
        .fallback(relay_endpoint)
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}
