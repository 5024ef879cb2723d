//! Carrier REST client
//!
//! Fetches call records from the carrier's HTTP API. Exactly one request per
//! lookup; retries, if any, belong to the caller.

use async_trait::async_trait;
use chibi_core::config::CarrierConfig;
use chibi_core::models::CarrierCall;
use chibi_core::traits::CallLookup;
use chibi_core::{AppError, AppResult};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default timeout for carrier API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for the carrier's call-record API
///
/// Authenticates with the carrier account SID and auth token via HTTP basic
/// auth, the carrier's documented scheme.
pub struct HttpCarrierClient {
    http: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
}

impl HttpCarrierClient {
    /// Create a client from carrier configuration
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &CarrierConfig) -> AppResult<Self> {
        let timeout = if config.timeout_secs > 0 {
            Duration::from_secs(config.timeout_secs)
        } else {
            DEFAULT_TIMEOUT
        };

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build carrier HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn call_url(&self, uuid: &str) -> String {
        format!(
            "{}/Accounts/{}/Calls/{}.json",
            self.base_url, self.account_sid, uuid
        )
    }
}

#[async_trait]
impl CallLookup for HttpCarrierClient {
    #[instrument(skip(self))]
    async fn fetch_call(&self, uuid: &str) -> AppResult<CarrierCall> {
        debug!("Fetching call record from carrier: {}", uuid);

        let response = self
            .http
            .get(self.call_url(uuid))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .map_err(|e| {
                warn!("Carrier request failed for {}: {}", uuid, e);
                AppError::Carrier(format!("Call lookup request failed: {}", e))
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(AppError::CallRecordNotFound(uuid.to_string()));
            }
            status if !status.is_success() => {
                warn!("Carrier returned {} for call {}", status, uuid);
                return Err(AppError::Carrier(format!(
                    "Call lookup returned status {}",
                    status
                )));
            }
            _ => {}
        }

        let payload: CallRecordPayload = response.json().await.map_err(|e| {
            warn!("Carrier returned malformed call record for {}: {}", uuid, e);
            AppError::Carrier(format!("Malformed call record: {}", e))
        })?;

        payload.into_call()
    }
}

/// Wire representation of a carrier call record
///
/// The carrier reports duration as a decimal string and omits optional
/// fields entirely; conversion to [`CarrierCall`] normalizes both.
#[derive(Debug, Deserialize)]
struct CallRecordPayload {
    sid: String,
    direction: String,
    start_time: Option<DateTime<Utc>>,
    duration: Option<String>,
    from: String,
    to: String,
    parent_call_sid: Option<String>,
}

impl CallRecordPayload {
    fn into_call(self) -> AppResult<CarrierCall> {
        let start_time = self
            .start_time
            .ok_or_else(|| AppError::MissingField("start_time".to_string()))?;

        let duration = match self.duration {
            Some(raw) => raw.parse::<i32>().map_err(|_| {
                AppError::Carrier(format!("Invalid duration in call record: {:?}", raw))
            })?,
            None => 0,
        };

        Ok(CarrierCall {
            uuid: self.sid,
            direction: self.direction,
            start_time,
            duration,
            from: self.from,
            to: self.to,
            parent_call_uuid: self.parent_call_sid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(duration: Option<&str>) -> CallRecordPayload {
        CallRecordPayload {
            sid: "CA1234".to_string(),
            direction: "outbound-dial".to_string(),
            start_time: Some(Utc::now()),
            duration: duration.map(str::to_string),
            from: "+819011112222".to_string(),
            to: "+818033334444".to_string(),
            parent_call_sid: Some("CA0001".to_string()),
        }
    }

    #[test]
    fn test_payload_conversion() {
        let call = payload(Some("42")).into_call().unwrap();
        assert_eq!(call.uuid, "CA1234");
        assert_eq!(call.duration, 42);
        assert_eq!(call.parent_call_uuid.as_deref(), Some("CA0001"));
    }

    #[test]
    fn test_missing_duration_defaults_to_zero() {
        let call = payload(None).into_call().unwrap();
        assert_eq!(call.duration, 0);
    }

    #[test]
    fn test_invalid_duration_is_carrier_error() {
        let err = payload(Some("abc")).into_call().unwrap_err();
        assert!(matches!(err, AppError::Carrier(_)));
    }

    #[test]
    fn test_missing_start_time_is_missing_field() {
        let mut p = payload(Some("1"));
        p.start_time = None;
        let err = p.into_call().unwrap_err();
        assert!(matches!(err, AppError::MissingField(_)));
    }

    #[test]
    fn test_call_url_layout() {
        let config = CarrierConfig {
            base_url: "https://api.carrier.example.com/2010-04-01/".to_string(),
            account_sid: "AC99".to_string(),
            auth_token: "secret".to_string(),
            timeout_secs: 5,
        };
        let client = HttpCarrierClient::new(&config).unwrap();
        assert_eq!(
            client.call_url("CA77"),
            "https://api.carrier.example.com/2010-04-01/Accounts/AC99/Calls/CA77.json"
        );
    }
}
