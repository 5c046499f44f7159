//! Wizard session state.
//!
//! The `WizardStore` owns the whole session: current step, draft, error
//! set, submission status, and language. All mutation goes through its
//! transition methods, and every successful mutation synchronously writes
//! a fresh snapshot through the injected storage adapter. Other components
//! receive immutable snapshots and never mutate shared state directly.

use serde::{Deserialize, Serialize};

use crate::persistence::{DraftStorage, SavedDraft};

use super::draft::{ApplicationDraft, FieldValue};
use super::schema::TOTAL_STEPS;
use super::validation::{self, ValidationErrors};

/// UI language for the session. Part of the persisted snapshot and the one
/// piece of state that survives a post-submission reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    /// Parse a language tag; anything unrecognized is `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "en" => Some(Language::En),
            "ar" => Some(Language::Ar),
            _ => None,
        }
    }
}

/// Where the session stands with respect to submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// The wizard state machine.
pub struct WizardStore {
    current_step: u8,
    draft: ApplicationDraft,
    errors: ValidationErrors,
    submission_status: SubmissionStatus,
    language: Language,
    saved_progress: bool,
    storage: Box<dyn DraftStorage>,
}

impl WizardStore {
    /// Construct a store bound to the given storage adapter and rehydrate
    /// any previously saved draft.
    pub fn new(storage: Box<dyn DraftStorage>) -> Self {
        let mut store = Self {
            current_step: 1,
            draft: ApplicationDraft::initial(),
            errors: ValidationErrors::new(),
            submission_status: SubmissionStatus::Idle,
            language: Language::default(),
            saved_progress: false,
            storage,
        };
        store.rehydrate();
        store
    }

    /// Load the persisted snapshot, if one exists and parses.
    ///
    /// Malformed or absent data falls back to the initial empty state
    /// without surfacing an error. Unknown field ids in the snapshot are
    /// dropped, and an out-of-range step is clamped into `[1, N]`.
    pub fn rehydrate(&mut self) {
        let Some(saved) = self.storage.load() else {
            tracing::debug!("No saved draft to rehydrate");
            return;
        };

        self.draft = ApplicationDraft::initial();
        self.draft.merge_known(&saved.form_data);
        self.current_step = saved.current_step.clamp(1, TOTAL_STEPS);
        self.language = saved.language;
        self.saved_progress = true;
        tracing::debug!(step = self.current_step, "Rehydrated saved draft");
    }

    /// 1-based current step.
    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    pub fn total_steps(&self) -> u8 {
        TOTAL_STEPS
    }

    /// Immutable view of the draft.
    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    /// A snapshot of the draft for collaborators (prompt construction,
    /// payload building).
    pub fn snapshot(&self) -> ApplicationDraft {
        self.draft.clone()
    }

    /// The current error set, field id to error key.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn submission_status(&self) -> SubmissionStatus {
        self.submission_status
    }

    /// Whether a snapshot has been written this session.
    pub fn saved_progress(&self) -> bool {
        self.saved_progress
    }

    /// Whether the given step's required fields all validate clean.
    pub fn step_complete(&self, step_index: u8) -> bool {
        validation::is_step_complete(step_index, &self.draft)
    }

    /// Whether the citizen may advance off the current step.
    pub fn can_advance(&self) -> bool {
        self.current_step < TOTAL_STEPS && self.step_complete(self.current_step)
    }

    /// Move to the next step if the current one is complete.
    ///
    /// A no-op otherwise: the UI is expected to gate the action, and an
    /// ungated call must not throw or move past the last step.
    pub fn advance(&mut self) {
        if !self.can_advance() {
            tracing::debug!(step = self.current_step, "Advance refused");
            return;
        }
        self.current_step += 1;
        self.persist();
    }

    /// Move to the previous step, clamped at 1. Going back is always
    /// allowed regardless of validity.
    pub fn retreat(&mut self) {
        if self.current_step > 1 {
            self.current_step -= 1;
            self.persist();
        }
    }

    /// Merge one field value into the draft and persist.
    ///
    /// Clears any stale error recorded for that field; other fields are not
    /// revalidated. Ids the schema does not declare are ignored.
    pub fn update_field(&mut self, field_id: &str, value: FieldValue) {
        if !self.draft.set(field_id, value) {
            tracing::warn!(field = field_id, "Ignoring update for unknown field");
            return;
        }
        self.errors.remove(field_id);
        self.persist();
    }

    /// Recompute and store the error set for the current step.
    pub fn validate_current_step(&mut self) -> &ValidationErrors {
        self.errors = validation::validate_step(self.current_step, &self.draft);
        &self.errors
    }

    /// Replace the stored error set (used by the submission pipeline when a
    /// whole-draft check fails).
    pub fn replace_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn set_submission_status(&mut self, status: SubmissionStatus) {
        self.submission_status = status;
    }

    /// Switch the UI language and persist the choice.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.persist();
    }

    /// Restore the initial empty draft after a successful submission.
    ///
    /// The selected language survives; the persisted snapshot is cleared.
    pub fn reset_after_submit(&mut self) {
        self.draft = ApplicationDraft::initial();
        self.current_step = 1;
        self.errors.clear();
        self.submission_status = SubmissionStatus::Idle;
        self.saved_progress = false;
        if let Err(e) = self.storage.clear() {
            tracing::warn!(error = %e, "Could not clear persisted draft");
        }
    }

    /// Write the current snapshot through the storage adapter. Best effort:
    /// a failed write is logged and the session continues.
    fn persist(&mut self) {
        let snapshot = SavedDraft {
            form_data: self.draft.as_map().clone(),
            current_step: self.current_step,
            language: self.language,
        };
        match self.storage.save(&snapshot) {
            Ok(()) => self.saved_progress = true,
            Err(e) => tracing::warn!(error = %e, "Could not persist draft"),
        }
    }
}
