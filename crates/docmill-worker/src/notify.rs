//! Best-effort webhook notifications.
//!
//! Delivery is fire-and-forget: failures are logged and never join the
//! job's error channel, so observability can't become a reliability
//! dependency of the pipeline.

use serde_json::{json, Value};
use tracing::{debug, warn};

use docmill_models::{JobId, JobOutcome};

/// Maximum characters of failure detail carried in a notification.
const CAUSE_MAX: usize = 512;

/// Notification sink posting job lifecycle events to a webhook.
#[derive(Debug, Clone)]
pub struct Notifier {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl Notifier {
    /// Create a notifier. `None` disables delivery entirely.
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    /// Notify that conversion of one format is starting.
    pub async fn converting(&self, job_id: &JobId, format: &str) {
        self.send(json!({
            "jobId": job_id,
            "status": "converting",
            "format": format,
        }))
        .await;
    }

    /// Notify the terminal outcome of a job. For failures, `detail` carries
    /// a truncated human-readable cause alongside the taxonomy reason.
    pub async fn outcome(&self, job_id: &JobId, outcome: &JobOutcome, detail: Option<&str>) {
        let mut payload = match serde_json::to_value(outcome) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to serialize outcome notification: {}", e);
                return;
            }
        };
        if let Value::Object(map) = &mut payload {
            map.insert("jobId".to_string(), json!(job_id));
            if let Some(detail) = detail {
                map.insert("error".to_string(), json!(truncate_cause(detail)));
            }
        }
        self.send(payload).await;
    }

    async fn send(&self, payload: Value) {
        let Some(endpoint) = &self.endpoint else {
            return;
        };

        match self.client.post(endpoint).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Delivered notification: {}", payload["status"]);
            }
            Ok(response) => {
                warn!(
                    "Notification endpoint returned {}: {}",
                    response.status(),
                    payload["status"]
                );
            }
            Err(e) => {
                warn!("Failed to deliver notification: {}", e);
            }
        }
    }
}

fn truncate_cause(s: &str) -> String {
    if s.len() <= CAUSE_MAX {
        return s.to_string();
    }
    s.chars().take(CAUSE_MAX).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmill_models::ResultEntry;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_completed_outcome_with_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({"status": "completed"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = Notifier::new(Some(format!("{}/hook", server.uri())));
        let outcome = JobOutcome::Completed {
            results: vec![ResultEntry {
                format: "docx".to_string(),
                storage_key: "results/j1/docx/a.docx".to_string(),
                filename: "a.docx".to_string(),
                size_bytes: 10,
            }],
        };
        notifier.outcome(&JobId::from_string("j1"), &outcome, None).await;
    }

    #[tokio::test]
    async fn failed_outcome_carries_reason_and_truncated_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "status": "failed",
                "reason": "conversion_nonzero_exit",
                "jobId": "j1",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = Notifier::new(Some(server.uri()));
        let outcome = JobOutcome::Failed {
            reason: "conversion_nonzero_exit".to_string(),
        };
        let long_detail = "e".repeat(CAUSE_MAX * 4);
        notifier
            .outcome(&JobId::from_string("j1"), &outcome, Some(&long_detail))
            .await;
    }

    #[tokio::test]
    async fn delivery_failure_never_bubbles_up() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = Notifier::new(Some(server.uri()));
        // Returns unit on HTTP failure; nothing to assert beyond not panicking.
        notifier.converting(&JobId::from_string("j1"), "docx").await;
    }

    #[tokio::test]
    async fn unconfigured_endpoint_is_a_no_op() {
        let notifier = Notifier::new(None);
        notifier.converting(&JobId::from_string("j1"), "docx").await;
    }

    #[test]
    fn cause_truncation_is_bounded() {
        assert_eq!(truncate_cause("short"), "short");
        assert_eq!(truncate_cause(&"x".repeat(CAUSE_MAX * 2)).len(), CAUSE_MAX);
    }
}
