//! # AWS SNS SMS Provider
//!
//! Amazon SNS implementation of [`SmsClient`] used by the relay to deliver
//! each recipient's message.
//!
//! ## Features
//!
//! - Send SMS messages via the SNS `Publish` action
//! - Regional endpoint configuration
//! - Standard retry mode with a bounded number of attempts
//! - Static keys or the default AWS credential chain
//!
//! ## Example
//!
//! ```rust,ignore
//! use sms_core::{SendRequest, SmsClient};
//! use sms_aws_sns::AwsSnsClient;
//!
//! let client = AwsSnsClient::with_default_credentials("ap-southeast-2", 10).await;
//! let response = client.send(SendRequest {
//!     to: "+61400000001",
//!     from: "",
//!     text: "Hello from AWS SNS!"
//! }).await?;
//! ```

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sns::{
    config::{retry::RetryConfig, Credentials},
    error::SdkError,
    operation::publish::PublishError,
    types::MessageAttributeValue,
    Client as SnsClient, Config as SnsConfig,
};
use sms_core::*;
use std::collections::HashMap;
use tracing::{debug, error, info};

pub const PROVIDER: &str = "aws-sns";
pub const DEFAULT_REGION: &str = "ap-southeast-2";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_SMS_TYPE: &str = "Transactional";

const SMS_TYPE_ATTRIBUTE: &str = "AWS.SNS.SMS.SMSType";
const SENDER_ID_ATTRIBUTE: &str = "AWS.SNS.SMS.SenderID";

/// AWS SNS SMS client
#[derive(Debug, Clone)]
pub struct AwsSnsClient {
    client: SnsClient,
    region: String,
    max_attempts: u32,
    sms_type: String,
}

impl AwsSnsClient {
    /// Create a new AWS SNS client from static credentials
    pub fn new(
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        max_attempts: u32,
    ) -> Self {
        let region = region.into();
        let max_attempts = max_attempts.max(1);

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None, // session_token
            None, // expiration
            "sms-relay",
        );

        let config = SnsConfig::builder()
            .region(Region::new(region.clone()))
            .credentials_provider(credentials)
            .retry_config(retry_config(max_attempts))
            .behavior_version(BehaviorVersion::latest())
            .build();

        Self {
            client: SnsClient::from_conf(config),
            region,
            max_attempts,
            sms_type: DEFAULT_SMS_TYPE.to_string(),
        }
    }

    /// Create a client using the default AWS credential chain
    pub async fn with_default_credentials(region: impl Into<String>, max_attempts: u32) -> Self {
        let region = region.into();
        let max_attempts = max_attempts.max(1);
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .retry_config(retry_config(max_attempts))
            .load()
            .await;

        Self {
            client: SnsClient::new(&config),
            region,
            max_attempts,
            sms_type: DEFAULT_SMS_TYPE.to_string(),
        }
    }

    /// Override the `SMSType` attribute ("Transactional" or "Promotional").
    pub fn with_sms_type(mut self, sms_type: impl Into<String>) -> Self {
        self.sms_type = sms_type.into();
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn message_attributes(
        &self,
        from: &str,
    ) -> Result<HashMap<String, MessageAttributeValue>, SmsError> {
        let mut attributes = HashMap::new();

        attributes.insert(
            SMS_TYPE_ATTRIBUTE.to_string(),
            string_attribute(&self.sms_type).map_err(|e| {
                SmsError::Provider(format!("Failed to build SMS type attribute: {}", e))
            })?,
        );

        // Numeric origination numbers are not sender ids
        if !from.is_empty() && !from.starts_with('+') {
            attributes.insert(
                SENDER_ID_ATTRIBUTE.to_string(),
                string_attribute(from).map_err(|e| {
                    SmsError::Provider(format!("Failed to build sender ID attribute: {}", e))
                })?,
            );
        }

        Ok(attributes)
    }
}

fn retry_config(max_attempts: u32) -> RetryConfig {
    RetryConfig::standard().with_max_attempts(max_attempts)
}

fn string_attribute(
    value: &str,
) -> Result<MessageAttributeValue, aws_sdk_sns::error::BuildError> {
    MessageAttributeValue::builder()
        .data_type("String")
        .string_value(value)
        .build()
}

/// Transport failures become `Http`; everything else is classified from the
/// service error.
fn classify_sdk_error<R>(error: SdkError<PublishError, R>) -> SmsError
where
    R: std::fmt::Debug + Send + Sync + 'static,
{
    match error {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            SmsError::Http(format!("AWS SNS request failed: {:?}", error))
        }
        error => classify_publish_error(error.into_service_error()),
    }
}

fn classify_publish_error(error: PublishError) -> SmsError {
    match error {
        PublishError::AuthorizationErrorException(_) => {
            SmsError::Auth("AWS authorization failed".to_string())
        }
        PublishError::InvalidParameterException(e) => {
            SmsError::Invalid(e.message().unwrap_or("Invalid parameter").to_string())
        }
        PublishError::InvalidParameterValueException(e) => {
            SmsError::Invalid(e.message().unwrap_or("Invalid parameter value").to_string())
        }
        e => SmsError::Provider(format!("AWS SNS error: {}", e)),
    }
}

#[async_trait]
impl SmsClient for AwsSnsClient {
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SmsError> {
        info!("Sending SMS via AWS SNS to {}", req.to);

        let message_attributes = self.message_attributes(req.from)?;
        debug!(
            "Sending SNS message with attributes: {:?}",
            message_attributes
        );

        let result = self
            .client
            .publish()
            .phone_number(req.to)
            .message(req.text)
            .set_message_attributes(Some(message_attributes))
            .send()
            .await
            .map_err(|e| {
                error!("AWS SNS publish failed: {}", e);
                classify_sdk_error(e)
            })?;

        let message_id = result
            .message_id()
            .map(str::to_string)
            .unwrap_or_else(fallback_id);

        info!(
            "SMS sent successfully via AWS SNS with MessageId: {}",
            message_id
        );

        let raw_json = serde_json::json!({
            "MessageId": message_id,
            "Region": self.region,
        });

        Ok(SendResponse {
            id: message_id,
            provider: PROVIDER,
            raw: raw_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sns::types::error::{AuthorizationErrorException, InvalidParameterException};

    fn client() -> AwsSnsClient {
        AwsSnsClient::new(DEFAULT_REGION, "test_key", "test_secret", DEFAULT_MAX_ATTEMPTS)
    }

    #[test]
    fn client_creation() {
        let client = client();
        assert_eq!(client.region(), "ap-southeast-2");
        assert_eq!(client.max_attempts(), 10);
    }

    #[test]
    fn zero_attempts_is_clamped() {
        let client = AwsSnsClient::new("us-east-1", "k", "s", 0);
        assert_eq!(client.max_attempts(), 1);
    }

    #[test]
    fn attributes_default_to_transactional() {
        let attributes = client().message_attributes("").unwrap();
        assert_eq!(attributes.len(), 1);
        assert_eq!(
            attributes[SMS_TYPE_ATTRIBUTE].string_value(),
            Some("Transactional")
        );
    }

    #[test]
    fn sender_id_only_for_alphanumeric_origin() {
        let client = client().with_sms_type("Promotional");

        let attributes = client.message_attributes("ACME").unwrap();
        assert_eq!(attributes[SENDER_ID_ATTRIBUTE].string_value(), Some("ACME"));
        assert_eq!(
            attributes[SMS_TYPE_ATTRIBUTE].string_value(),
            Some("Promotional")
        );

        let attributes = client.message_attributes("+61400000000").unwrap();
        assert!(!attributes.contains_key(SENDER_ID_ATTRIBUTE));
    }

    #[test]
    fn transport_failures_are_http_errors() {
        let timeout = SdkError::<PublishError, ()>::timeout_error("operation timed out");
        assert!(matches!(classify_sdk_error(timeout), SmsError::Http(_)));

        let service = SdkError::<PublishError, ()>::service_error(
            PublishError::AuthorizationErrorException(
                AuthorizationErrorException::builder().build(),
            ),
            (),
        );
        assert!(matches!(classify_sdk_error(service), SmsError::Auth(_)));
    }

    #[test]
    fn publish_errors_are_classified() {
        let auth = PublishError::AuthorizationErrorException(
            AuthorizationErrorException::builder().build(),
        );
        assert!(matches!(classify_publish_error(auth), SmsError::Auth(_)));

        let invalid = PublishError::InvalidParameterException(
            InvalidParameterException::builder()
                .message("Invalid parameter: PhoneNumber")
                .build(),
        );
        match classify_publish_error(invalid) {
            SmsError::Invalid(msg) => assert_eq!(msg, "Invalid parameter: PhoneNumber"),
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
