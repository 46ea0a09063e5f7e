// [libs/infra/license-client/src/client.rs]
/*!
 * APARATO: LICENSE VALIDATION CLIENT
 * RESPONSABILIDAD: NEGOCIACION HTTP CON EL REGISTRO EXTERNO DE LICENCIAS
 *
 * Stateless, single-remote-endpoint client. A blocking
 * `reqwest::blocking::Client` backs it because the License
 * Manager's ticker runs on its own OS thread, not inside the tokio
 * runtime the rest of the engine uses. Every call is
 * wire-compatible with the webhook protocol: `X-API-Key` header,
 * positional hardware slots (motherboard, CPU, MAC), and a 5xx retry
 * policy of two attempts with 1s/4s backoff before collapsing to a
 * network failure.
 */

use std::thread::sleep;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use wbe_domain_models::license::HardwareComponents;

use crate::errors::LicenseClientError;

const RETRY_BACKOFFS: &[Duration] = &[Duration::from_secs(1), Duration::from_secs(4)];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Activate,
    Validate,
    Transfer,
    RevocationCheck,
    UsageReport,
}

#[derive(Debug, Serialize)]
struct WebhookRequest<'a> {
    event_type: EventType,
    license_key: &'a str,
    hw1: &'a str,
    hw2: &'a str,
    hw3: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    licensee_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    licensee_email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_tier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_transfer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    month: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<&'a serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    Active,
    Revoked,
    Expired,
    Pending,
}

#[derive(Debug, Deserialize)]
struct WebhookResponse {
    status: Option<RemoteStatus>,
    license_tier: Option<String>,
    expiry_date: Option<NaiveDate>,
    transfer_count: Option<u32>,
    error: Option<String>,
    revoked: Option<bool>,
}

/// The validated, successfully-decoded subset of a webhook response —
/// never constructed from a response missing `status`/`license_tier`/
/// `expiry_date` — absent required fields are treated as a network
/// failure, never as active.
#[derive(Debug, Clone, PartialEq)]
pub struct LicenseDecision {
    pub status: RemoteStatus,
    pub license_tier: String,
    pub expiry_date: NaiveDate,
    pub transfer_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferResult {
    pub status: RemoteStatus,
    pub transfer_count: u32,
}

#[derive(Clone)]
pub struct LicenseValidationClient {
    http: Client,
    webhook_url: String,
    api_key: String,
}

impl LicenseValidationClient {
    pub fn new(webhook_url: String, api_key: String, request_timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .timeout(request_timeout)
                .build()
                .expect("FATAL: license client initialization failed"),
            webhook_url,
            api_key,
        }
    }

    #[instrument(skip(self))]
    pub fn activate(
        &self,
        license_key: &str,
        hw: &HardwareComponents,
        licensee_name: Option<&str>,
        licensee_email: Option<&str>,
        license_tier: Option<&str>,
    ) -> Result<LicenseDecision, LicenseClientError> {
        let request = WebhookRequest {
            event_type: EventType::Activate,
            license_key,
            hw1: &hw.motherboard_hash,
            hw2: &hw.cpu_hash,
            hw3: &hw.mac_hash,
            licensee_name,
            licensee_email,
            license_tier,
            is_transfer: None,
            month: None,
            stats: None,
        };
        self.send_and_decide(&request)
    }

    #[instrument(skip(self))]
    pub fn validate(&self, license_key: &str, hw: &HardwareComponents) -> Result<LicenseDecision, LicenseClientError> {
        let request = WebhookRequest {
            event_type: EventType::Validate,
            license_key,
            hw1: &hw.motherboard_hash,
            hw2: &hw.cpu_hash,
            hw3: &hw.mac_hash,
            licensee_name: None,
            licensee_email: None,
            license_tier: None,
            is_transfer: None,
            month: None,
            stats: None,
        };
        self.send_and_decide(&request)
    }

    #[instrument(skip(self))]
    pub fn transfer(
        &self,
        license_key: &str,
        new_hw: &HardwareComponents,
    ) -> Result<TransferResult, LicenseClientError> {
        let request = WebhookRequest {
            event_type: EventType::Transfer,
            license_key,
            hw1: &new_hw.motherboard_hash,
            hw2: &new_hw.cpu_hash,
            hw3: &new_hw.mac_hash,
            licensee_name: None,
            licensee_email: None,
            license_tier: None,
            is_transfer: Some(true),
            month: None,
            stats: None,
        };
        let decision = self.send_and_decide(&request)?;
        Ok(TransferResult { status: decision.status, transfer_count: decision.transfer_count })
    }

    /// Cheap, frequent check used before protected operations
    /// Deliberately skips
    /// the full response-validation path — it only needs `revoked`.
    #[instrument(skip(self))]
    pub fn revocation_check(&self, license_key: &str, hw: &HardwareComponents) -> Result<bool, LicenseClientError> {
        let request = WebhookRequest {
            event_type: EventType::RevocationCheck,
            license_key,
            hw1: &hw.motherboard_hash,
            hw2: &hw.cpu_hash,
            hw3: &hw.mac_hash,
            licensee_name: None,
            licensee_email: None,
            license_tier: None,
            is_transfer: None,
            month: None,
            stats: None,
        };
        let response = self.post_with_retry(&request)?;
        response.revoked.ok_or_else(|| LicenseClientError::Network("revocation_check response missing 'revoked'".into()))
    }

    #[instrument(skip(self, stats))]
    pub fn report_usage(
        &self,
        license_key: &str,
        hw: &HardwareComponents,
        month: &str,
        stats: serde_json::Value,
    ) -> Result<(), LicenseClientError> {
        let request = WebhookRequest {
            event_type: EventType::UsageReport,
            license_key,
            hw1: &hw.motherboard_hash,
            hw2: &hw.cpu_hash,
            hw3: &hw.mac_hash,
            licensee_name: None,
            licensee_email: None,
            license_tier: None,
            is_transfer: None,
            month: Some(month),
            stats: Some(&stats),
        };
        // Fire-and-forget: a failure here is logged,
        // never surfaced as a licensing-state change.
        match self.post_with_retry(&request) {
            Ok(_) => Ok(()),
            Err(fault) => {
                warn!("📉 [LICENSE_CLIENT]: usage report failed, dropping: {}", fault);
                Ok(())
            }
        }
    }

    fn send_and_decide(&self, request: &WebhookRequest) -> Result<LicenseDecision, LicenseClientError> {
        let response = self.post_with_retry(request)?;
        let (status, license_tier, expiry_date) = match (response.status, response.license_tier, response.expiry_date) {
            (Some(s), Some(t), Some(e)) => (s, t, e),
            _ => return Err(LicenseClientError::Network("response missing required fields".into())),
        };
        Ok(LicenseDecision {
            status,
            license_tier,
            expiry_date,
            transfer_count: response.transfer_count.unwrap_or(0),
        })
    }

    fn post_with_retry(&self, request: &WebhookRequest) -> Result<WebhookResponse, LicenseClientError> {
        let mut attempt = 0usize;
        loop {
            match self.post_once(request) {
                Ok(response) => return Ok(response),
                Err(LicenseClientError::InvalidKey(msg)) => return Err(LicenseClientError::InvalidKey(msg)),
                Err(retryable) => {
                    if attempt >= RETRY_BACKOFFS.len() {
                        return Err(retryable);
                    }
                    warn!("🔁 [LICENSE_CLIENT]: attempt {} failed ({}), retrying.", attempt + 1, retryable);
                    sleep(RETRY_BACKOFFS[attempt]);
                    attempt += 1;
                }
            }
        }
    }

    fn post_once(&self, request: &WebhookRequest) -> Result<WebhookResponse, LicenseClientError> {
        let outcome = self
            .http
            .post(&self.webhook_url)
            .header("X-API-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send();

        let response = match outcome {
            Ok(r) => r,
            Err(fault) => return Err(LicenseClientError::Network(fault.to_string())),
        };

        match response.status() {
            StatusCode::OK => response
                .json::<WebhookResponse>()
                .map_err(|fault| LicenseClientError::Network(format!("malformed response body: {fault}"))),
            status if status.is_client_error() => {
                let body: WebhookResponse = response.json().unwrap_or(WebhookResponse {
                    status: None,
                    license_tier: None,
                    expiry_date: None,
                    transfer_count: None,
                    error: None,
                    revoked: None,
                });
                if body.error.as_deref() == Some("unauthorized") {
                    Err(LicenseClientError::InvalidKey(format!("HTTP {status}")))
                } else {
                    Err(LicenseClientError::Network(format!("HTTP {status}")))
                }
            }
            status => Err(LicenseClientError::Network(format!("HTTP {status} (server fault)"))),
        }
    }
}

/// Convenience for logging/audit entries; not part of the wire
/// contract.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardware_slots_are_positionally_stable() {
        let request = WebhookRequest {
            event_type: EventType::Validate,
            license_key: "KEY",
            hw1: "MB-1",
            hw2: "CPU-1",
            hw3: "MAC-1",
            licensee_name: None,
            licensee_email: None,
            license_tier: None,
            is_transfer: None,
            month: None,
            stats: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["hw1"], "MB-1");
        assert_eq!(value["hw2"], "CPU-1");
        assert_eq!(value["hw3"], "MAC-1");
        assert_eq!(value["event_type"], "validate");
    }

    #[test]
    fn event_types_serialize_to_spec_strings() {
        assert_eq!(serde_json::to_value(EventType::RevocationCheck).unwrap(), "revocation_check");
        assert_eq!(serde_json::to_value(EventType::UsageReport).unwrap(), "usage_report");
    }

    #[test]
    fn response_missing_required_fields_is_never_treated_as_active() {
        let response = WebhookResponse {
            status: Some(RemoteStatus::Active),
            license_tier: None,
            expiry_date: None,
            transfer_count: None,
            error: None,
            revoked: None,
        };
        assert!(response.license_tier.is_none() && response.expiry_date.is_none());
    }
}
