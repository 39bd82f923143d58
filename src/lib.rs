//! # SMS Relay
//!
//! An authenticated webhook that turns one form POST into one SMS per
//! recipient, sent through AWS SNS.
//!
//! ## Features
//!
//! - **Shared-secret authentication**: every request carries an `authToken` form field
//! - **Fan-out with isolated failures**: a failed send never aborts the others
//! - **In-band reporting**: `{"successful": [...], "failed": [...]}` with status 200
//! - **Framework agnostic**: the pipeline lives in `sms-web-generic`; axum and
//!   function URL events are adapters
//! - **Layered configuration**: defaults, files and environment variables
//! - **Observability**: structured logging through `tracing`
//!
//! ## Request
//!
//! `POST /send` with a base64-encoded `application/x-www-form-urlencoded` body:
//!
//! ```text
//! authToken=<secret>&message=Hello&to=%2B61400000001&to=%2B61400000002
//! ```
//!
//! ## Wiring
//!
//! ```rust,ignore
//! use sms_relay::prelude::*;
//!
//! let config = AppConfig::load()?;
//! let client = sms_relay::build_sns_client(&config.aws_sns).await;
//! let handler = sms_relay::build_handler(&config, Arc::new(client));
//! let response = handler.handle(request).await;
//! ```

pub mod config;
pub mod logging;

pub use config::*;

use sms_aws_sns::AwsSnsClient;
use sms_core::SmsClient;
use sms_web_generic::RelayHandler;
use std::sync::Arc;

/// Build the SNS notifier: static keys when configured, otherwise the
/// default AWS credential chain.
pub async fn build_sns_client(config: &AwsSnsConfig) -> AwsSnsClient {
    let client = match config.static_credentials() {
        Some((access_key_id, secret_access_key)) => AwsSnsClient::new(
            config.region.as_str(),
            access_key_id,
            secret_access_key,
            config.max_attempts,
        ),
        None => {
            AwsSnsClient::with_default_credentials(config.region.as_str(), config.max_attempts)
                .await
        }
    };
    client.with_sms_type(config.sms_type.as_str())
}

/// Wire a [`RelayHandler`] around an already constructed notifier.
pub fn build_handler(config: &AppConfig, client: Arc<dyn SmsClient>) -> RelayHandler {
    let handler = RelayHandler::new(client, config.security.auth_token.as_str())
        .with_max_concurrency(config.dispatch.max_concurrency);

    match &config.aws_sns.sender_id {
        Some(sender_id) => handler.with_sender_id(sender_id.as_str()),
        None => handler,
    }
}

/// Common imports for SMS Relay usage
pub mod prelude {
    pub use crate::config::{
        AppConfig, AwsSnsConfig, DispatchConfig, LoggingConfig, SecurityConfig, ServerConfig,
    };
    pub use crate::{build_handler, build_sns_client};
    pub use sms_core::*;
    pub use sms_web_generic::{DispatchResult, Payload, RelayHandler, RelayRequest};
}
