//! AI-assisted drafting.
//!
//! Manages one suggestion session at a time: the user asks for help on a
//! free-text field, the remote text generator produces a draft, and the
//! user commits or discards it. A session moves `idle -> requesting ->
//! {ready | failed}`; committing or discarding returns it to `idle`.
//! Failures are session-scoped and never block the rest of the form.

mod credentials;
mod openai;
mod prompt;

pub use credentials::{CredentialChain, CredentialError, SecretValue, GENERATION_KEY_ENV};
pub use openai::GenerationClient;
pub use prompt::{prompt_for_field, SYSTEM_INSTRUCTION};

use std::time::Duration;

use async_trait::async_trait;

use crate::form::{ApplicationDraft, FieldValue, WizardStore};

/// Bound on how long a suggestion request may stay outstanding.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The external text-generation collaborator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce suggestion text for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String, SuggestionError>;
}

/// Why a suggestion request failed. Every variant maps to a distinct
/// user-facing message; none is fatal to the wizard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuggestionError {
    #[error("API key not configured. Set one through the settings flow or the environment.")]
    MissingCredential,

    #[error("Invalid API key. Please check your API key.")]
    Unauthorized,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Text generation server error. Please try again later.")]
    Server,

    #[error("Request timed out. Please try again.")]
    Timeout,

    #[error("Network error. Please check your internet connection and try again.")]
    Network,

    #[error("Invalid response from the text generation service.")]
    MalformedResponse,

    #[error("{0}")]
    Api(String),
}

/// Lifecycle of the current suggestion session.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionState {
    /// No session open.
    Idle,
    /// A request is outstanding.
    Requesting,
    /// Suggestion text is ready for the user to commit or discard.
    Ready { text: String },
    /// The request failed; the user may retry or discard.
    Failed { error: SuggestionError },
}

/// Handle for one issued request. Resolving with a ticket that is no longer
/// current is ignored, which is how a newer request supersedes an older one.
#[derive(Debug)]
pub struct RequestTicket {
    seq: u64,
    /// Field the suggestion targets.
    pub field_id: String,
    /// The constructed prompt to send to the generator.
    pub prompt: String,
}

/// One-at-a-time suggestion session manager.
pub struct SuggestionWorkflow {
    field_id: Option<String>,
    state: SuggestionState,
    seq: u64,
}

impl SuggestionWorkflow {
    pub fn new() -> Self {
        Self { field_id: None, state: SuggestionState::Idle, seq: 0 }
    }

    pub fn state(&self) -> &SuggestionState {
        &self.state
    }

    /// The field the open session targets, if any.
    pub fn field_id(&self) -> Option<&str> {
        self.field_id.as_deref()
    }

    /// Open a session for `field_id` and build its prompt from the draft
    /// snapshot.
    ///
    /// Any previous session is superseded: a still-outstanding request's
    /// eventual resolution will be ignored, and a terminal session for
    /// another field is discarded.
    pub fn begin_request(&mut self, field_id: &str, snapshot: &ApplicationDraft) -> RequestTicket {
        self.seq += 1;
        self.field_id = Some(field_id.to_string());
        self.state = SuggestionState::Requesting;
        tracing::debug!(field = field_id, seq = self.seq, "Suggestion requested");
        RequestTicket {
            seq: self.seq,
            field_id: field_id.to_string(),
            prompt: prompt::prompt_for_field(field_id, snapshot),
        }
    }

    /// Deliver a request's outcome. Stale tickets (superseded by a newer
    /// `begin_request`) are ignored.
    pub fn resolve(&mut self, ticket: &RequestTicket, result: Result<String, SuggestionError>) {
        if ticket.seq != self.seq {
            tracing::debug!(field = %ticket.field_id, "Ignoring stale suggestion result");
            return;
        }
        self.state = match result {
            Ok(text) => SuggestionState::Ready { text: text.trim().to_string() },
            Err(error) => {
                tracing::warn!(field = %ticket.field_id, error = %error, "Suggestion request failed");
                SuggestionState::Failed { error }
            }
        };
    }

    /// Commit the ready suggestion into the target field and close the
    /// session. Returns `false` (leaving everything untouched) when no
    /// suggestion is ready.
    ///
    /// The UI may label this either "accept" or "edit"; both commit the
    /// current text, and any user edits arrive as ordinary field updates.
    pub fn commit(&mut self, store: &mut WizardStore) -> bool {
        let SuggestionState::Ready { text } = &self.state else {
            return false;
        };
        let Some(field_id) = self.field_id.clone() else {
            return false;
        };
        store.update_field(&field_id, FieldValue::Text(text.clone()));
        self.close();
        true
    }

    /// Close the session without touching the draft.
    pub fn discard(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.field_id = None;
        self.state = SuggestionState::Idle;
    }

    /// Issue a request and drive it to resolution against the given
    /// generator, bounded by [`REQUEST_TIMEOUT`].
    ///
    /// Convenience for callers that do not manage the future themselves;
    /// callers that do use `begin_request` / `resolve` directly.
    pub async fn run_request(
        &mut self,
        generator: &dyn TextGenerator,
        field_id: &str,
        snapshot: &ApplicationDraft,
    ) -> &SuggestionState {
        let ticket = self.begin_request(field_id, snapshot);
        let result = match tokio::time::timeout(REQUEST_TIMEOUT, generator.generate(&ticket.prompt))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(SuggestionError::Timeout),
        };
        self.resolve(&ticket, result);
        self.state()
    }
}

impl Default for SuggestionWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    struct CannedGenerator {
        result: Result<String, SuggestionError>,
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, SuggestionError> {
            self.result.clone()
        }
    }

    fn snapshot() -> ApplicationDraft {
        ApplicationDraft::initial()
    }

    fn store() -> WizardStore {
        WizardStore::new(Box::new(MemoryStorage::new()))
    }

    #[test]
    fn test_lifecycle_request_ready_commit() {
        let mut workflow = SuggestionWorkflow::new();
        let mut store = store();

        let ticket = workflow.begin_request("reasonForApplying", &snapshot());
        assert_eq!(workflow.state(), &SuggestionState::Requesting);

        workflow.resolve(&ticket, Ok("  I lost my job in March.  ".to_string()));
        assert_eq!(
            workflow.state(),
            &SuggestionState::Ready { text: "I lost my job in March.".to_string() }
        );

        assert!(workflow.commit(&mut store));
        assert_eq!(store.draft().display("reasonForApplying"), "I lost my job in March.");
        assert_eq!(workflow.state(), &SuggestionState::Idle);
        assert!(workflow.field_id().is_none());
    }

    #[test]
    fn test_discard_leaves_field_untouched() {
        let mut workflow = SuggestionWorkflow::new();
        let mut store = store();
        store.update_field("reasonForApplying", "my own words".into());

        let snapshot = store.snapshot();
        let ticket = workflow.begin_request("reasonForApplying", &snapshot);
        workflow.resolve(&ticket, Ok("generated text".to_string()));
        workflow.discard();

        assert_eq!(store.draft().display("reasonForApplying"), "my own words");
        assert_eq!(workflow.state(), &SuggestionState::Idle);
    }

    #[test]
    fn test_failure_is_terminal_but_recoverable() {
        let mut workflow = SuggestionWorkflow::new();
        let ticket = workflow.begin_request("employmentCircumstances", &snapshot());
        workflow.resolve(&ticket, Err(SuggestionError::RateLimited));
        assert_eq!(
            workflow.state(),
            &SuggestionState::Failed { error: SuggestionError::RateLimited }
        );

        // retry opens a fresh request for the same field
        let retry = workflow.begin_request("employmentCircumstances", &snapshot());
        assert_eq!(workflow.state(), &SuggestionState::Requesting);
        workflow.resolve(&retry, Ok("better luck".to_string()));
        assert!(matches!(workflow.state(), SuggestionState::Ready { .. }));
    }

    #[test]
    fn test_newer_request_supersedes_in_flight_one() {
        let mut workflow = SuggestionWorkflow::new();
        let first = workflow.begin_request("currentFinancialSituation", &snapshot());
        let second = workflow.begin_request("reasonForApplying", &snapshot());

        // the first request resolves late; the session must keep tracking
        // the second request's field
        workflow.resolve(&first, Ok("stale text".to_string()));
        assert_eq!(workflow.state(), &SuggestionState::Requesting);
        assert_eq!(workflow.field_id(), Some("reasonForApplying"));

        workflow.resolve(&second, Ok("fresh text".to_string()));
        assert_eq!(workflow.state(), &SuggestionState::Ready { text: "fresh text".to_string() });
    }

    #[test]
    fn test_commit_without_ready_suggestion_is_a_no_op() {
        let mut workflow = SuggestionWorkflow::new();
        let mut store = store();
        assert!(!workflow.commit(&mut store));

        workflow.begin_request("reasonForApplying", &snapshot());
        assert!(!workflow.commit(&mut store));
        assert_eq!(store.draft().display("reasonForApplying"), "");
    }

    #[tokio::test]
    async fn test_run_request_resolves_against_generator() {
        let mut workflow = SuggestionWorkflow::new();
        let generator = CannedGenerator { result: Ok("drafted for you".to_string()) };

        workflow.run_request(&generator, "reasonForApplying", &snapshot()).await;
        assert_eq!(
            workflow.state(),
            &SuggestionState::Ready { text: "drafted for you".to_string() }
        );
    }

    #[tokio::test]
    async fn test_run_request_surfaces_generator_failure() {
        let mut workflow = SuggestionWorkflow::new();
        let generator = CannedGenerator { result: Err(SuggestionError::Network) };

        workflow.run_request(&generator, "reasonForApplying", &snapshot()).await;
        assert_eq!(workflow.state(), &SuggestionState::Failed { error: SuggestionError::Network });
    }
}
