//! The notification dispatcher (spec §4.9): HTTP POST to the
//! configured bridge URL with bounded retry and exponential backoff.
//! Grounded on the teacher's `push_sender.rs` (HTTP failure
//! classification) and `retry.rs` (backoff schedule), generalized
//! from APNs-specific delivery to a plain JSON webhook.
//!
//! Pure collaborator: never reads from or writes to the entity store
//! (spec §4.9 "The dispatcher is a pure collaborator").

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_BACKOFF_SECONDS: u64 = 1;
const DEFAULT_MAX_BACKOFF_SECONDS: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureClass {
    Transient,
    Permanent,
}

#[derive(Debug, Serialize)]
struct NotificationPayload<'a> {
    title: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sound: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Value>,
}

#[derive(Debug, Clone, Copy)]
pub struct DeliveryOutcome {
    pub delivered: bool,
    pub attempts: u32,
}

pub struct Notifier {
    client: reqwest::Client,
    bridge_url: String,
}

impl Notifier {
    pub fn new(bridge_url: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_ATTEMPT_TIMEOUT)
            .build()?;
        Ok(Self { client, bridge_url })
    }

    /// Sends with up to [`DEFAULT_MAX_ATTEMPTS`] attempts. Exhaustion
    /// returns `Ok(DeliveryOutcome { delivered: false, .. })` rather
    /// than an error; callers that need `DeliveryFailed` (spec §7)
    /// wrap that case themselves.
    pub async fn notify(
        &self,
        title: &str,
        message: &str,
        sound: Option<&str>,
        metadata: Option<&Value>,
    ) -> DeliveryOutcome {
        let payload = NotificationPayload {
            title,
            message,
            sound,
            metadata,
        };

        for attempt in 1..=DEFAULT_MAX_ATTEMPTS {
            match self.send_once(&payload).await {
                Ok(()) => {
                    return DeliveryOutcome {
                        delivered: true,
                        attempts: attempt,
                    };
                }
                Err(FailureClass::Permanent) => {
                    warn!(attempt, "notification bridge rejected request, not retrying");
                    return DeliveryOutcome {
                        delivered: false,
                        attempts: attempt,
                    };
                }
                Err(FailureClass::Transient) => {
                    if attempt == DEFAULT_MAX_ATTEMPTS {
                        warn!(attempt, "notification bridge delivery exhausted retries");
                        return DeliveryOutcome {
                            delivered: false,
                            attempts: attempt,
                        };
                    }
                    let delay = retry_delay_seconds(
                        DEFAULT_BASE_BACKOFF_SECONDS,
                        DEFAULT_MAX_BACKOFF_SECONDS,
                        attempt,
                    );
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                }
            }
        }

        DeliveryOutcome {
            delivered: false,
            attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    async fn send_once(&self, payload: &NotificationPayload<'_>) -> Result<(), FailureClass> {
        let response = self
            .client
            .post(&self.bridge_url)
            .json(payload)
            .send()
            .await
            .map_err(|_| FailureClass::Transient)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(classify_http_failure(status))
    }
}

fn classify_http_failure(status: StatusCode) -> FailureClass {
    match status.as_u16() {
        408 | 425 | 429 | 500 | 502 | 503 | 504 => FailureClass::Transient,
        _ => FailureClass::Permanent,
    }
}

/// Exponential backoff: `base * 2^(attempt-1)`, capped at `max`.
fn retry_delay_seconds(base_seconds: u64, max_seconds: u64, attempt: u32) -> u64 {
    if attempt <= 1 {
        return base_seconds.min(max_seconds);
    }

    let exponent = attempt.saturating_sub(1).min(20);
    let multiplier = 1_u64 << exponent;
    base_seconds.saturating_mul(multiplier).min(max_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_retryable_http_status_codes_as_transient() {
        assert_eq!(
            classify_http_failure(StatusCode::TOO_MANY_REQUESTS),
            FailureClass::Transient
        );
        assert_eq!(
            classify_http_failure(StatusCode::SERVICE_UNAVAILABLE),
            FailureClass::Transient
        );
    }

    #[test]
    fn classifies_client_errors_as_permanent() {
        assert_eq!(
            classify_http_failure(StatusCode::BAD_REQUEST),
            FailureClass::Permanent
        );
        assert_eq!(
            classify_http_failure(StatusCode::GONE),
            FailureClass::Permanent
        );
    }

    #[test]
    fn retry_backoff_is_exponential_and_capped() {
        assert_eq!(retry_delay_seconds(1, 4, 1), 1);
        assert_eq!(retry_delay_seconds(1, 4, 2), 2);
        assert_eq!(retry_delay_seconds(1, 4, 3), 4);
        assert_eq!(retry_delay_seconds(1, 4, 10), 4);
    }
}
