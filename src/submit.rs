//! Application submission.
//!
//! The pipeline re-validates the whole draft (defense in depth; the UI is
//! expected to have gated the action already), enriches it with an
//! application identifier and a submission timestamp, and forwards it to
//! the submission collaborator. On success the wizard store is reset and
//! persisted storage cleared; on failure the draft and step are left
//! untouched so the citizen can retry without re-entering anything.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::CredentialChain;
use crate::form::validation::{self, ValidationErrors};
use crate::form::{ApplicationDraft, FieldValue, SubmissionStatus, WizardStore};

const DEFAULT_BASE_URL: &str = "http://localhost:3001/api";
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// The enriched draft sent to the submission collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload {
    /// Flattened form data, field id to value.
    #[serde(flatten)]
    pub form_data: BTreeMap<String, FieldValue>,

    /// ISO-8601 submission timestamp.
    #[serde(rename = "submittedAt")]
    pub submitted_at: String,

    /// Collision-resistant application identifier.
    #[serde(rename = "applicationId")]
    pub application_id: String,
}

impl SubmissionPayload {
    /// Enrich a draft snapshot with an id and timestamp.
    pub fn from_draft(draft: &ApplicationDraft) -> Self {
        let now = Utc::now();
        Self {
            form_data: draft.as_map().clone(),
            submitted_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            application_id: generate_application_id(now.timestamp_millis()),
        }
    }
}

/// `APP-<base36 timestamp>-<5 char random suffix>`, uppercase.
///
/// Uniqueness is best effort; the id is not guaranteed unique across
/// distributed submitters.
fn generate_application_id(timestamp_millis: i64) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(5).collect();
    format!("APP-{}-{}", to_base36(timestamp_millis.unsigned_abs()), suffix).to_uppercase()
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ascii")
}

/// What the collaborator acknowledged.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    /// Response body as returned by the collaborator.
    pub body: serde_json::Value,
}

/// Failure talking to the submission collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmissionError {
    #[error("Request timed out. Please try again.")]
    Timeout,

    #[error("Network error. Please check your internet connection and try again.")]
    Network,

    #[error("Submission rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// The external submission collaborator.
#[async_trait]
pub trait SubmissionBackend: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload)
        -> Result<SubmissionReceipt, SubmissionError>;
}

/// HTTP submission backend.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    session_token: CredentialChain,
}

impl HttpBackend {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            session_token: CredentialChain::session_token(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionBackend for HttpBackend {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let mut request = self
            .client
            .post(format!("{}/applications", self.base_url))
            .header("Content-Type", "application/json")
            .timeout(SUBMIT_TIMEOUT)
            .json(payload);

        if let Ok(token) = self.session_token.resolve() {
            request = request.header("Authorization", format!("Bearer {}", token.expose()));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SubmissionError::Timeout
            } else {
                SubmissionError::Network
            }
        })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            // a rejected session credential is stale; drop it
            if let Err(e) = self.session_token.remove() {
                tracing::warn!(error = %e, "Could not clear stored session token");
            }
        }

        let body_text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body_text, status.as_u16()),
            });
        }

        match serde_json::from_str(&body_text) {
            Ok(body) => Ok(SubmissionReceipt { body }),
            Err(_) => Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message: "Empty or unreadable response body".to_string(),
            }),
        }
    }
}

/// Pull the best available human-readable reason out of a failure body.
fn rejection_message(body: &str, status: u16) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
        #[serde(default, rename = "missingFields")]
        missing_fields: Vec<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if !parsed.missing_fields.is_empty() {
            return format!("Missing required fields: {}", parsed.missing_fields.join(", "));
        }
        if let Some(message) = parsed.message.or(parsed.error).filter(|m| !m.is_empty()) {
            return message;
        }
    }
    format!("Submission failed with status {status}")
}

/// Outcome of a submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionResult {
    /// The collaborator accepted the application; the store was reset.
    Accepted { application_id: String, submitted_at: String },

    /// The draft failed whole-form validation; the collaborator was never
    /// contacted. Errors were written into the store for inline rendering.
    InvalidDraft(ValidationErrors),

    /// The collaborator rejected the submission or was unreachable. Draft
    /// and step are untouched so the citizen can retry.
    Rejected { reason: String },
}

/// Validates, enriches, submits, and cleans up after the wizard.
pub struct SubmissionPipeline {
    backend: Box<dyn SubmissionBackend>,
}

impl SubmissionPipeline {
    pub fn new(backend: Box<dyn SubmissionBackend>) -> Self {
        Self { backend }
    }

    /// Submit the store's current draft.
    ///
    /// Duplicate submits while one is in flight are the caller's problem;
    /// the pipeline does not deduplicate concurrent calls.
    pub async fn submit(&self, store: &mut WizardStore) -> SubmissionResult {
        let errors = validation::validate_all(store.draft());
        if !errors.is_empty() {
            tracing::debug!(fields = errors.len(), "Refusing to submit an invalid draft");
            store.replace_errors(errors.clone());
            store.set_submission_status(SubmissionStatus::Idle);
            return SubmissionResult::InvalidDraft(errors);
        }

        store.clear_errors();
        store.set_submission_status(SubmissionStatus::InFlight);
        let payload = SubmissionPayload::from_draft(store.draft());

        match self.backend.submit(&payload).await {
            Ok(_receipt) => {
                tracing::info!(application_id = %payload.application_id, "Application submitted");
                store.reset_after_submit();
                store.set_submission_status(SubmissionStatus::Succeeded);
                SubmissionResult::Accepted {
                    application_id: payload.application_id,
                    submitted_at: payload.submitted_at,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Submission failed");
                store.set_submission_status(SubmissionStatus::Failed);
                SubmissionResult::Rejected { reason: e.to_string() }
            }
        }
    }
}
