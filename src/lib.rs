//! # Supportflow
//!
//! Core of a multi-step social support application wizard: a citizen fills
//! in a three-step form, in-progress work persists across sessions, every
//! field is validated before the wizard advances, and the free-text fields
//! can be drafted with AI assistance the citizen accepts or discards before
//! submitting.
//!
//! ## Architecture
//!
//! - [`form`] - the wizard core: static form configuration, the draft,
//!   pure validation, and the [`form::WizardStore`] state machine
//! - [`persistence`] - durable local storage for the draft snapshot
//! - [`ai`] - the one-at-a-time suggestion session and the remote
//!   text-generation collaborator behind the [`ai::TextGenerator`] seam
//! - [`submit`] - whole-draft validation, payload enrichment, and the
//!   submission collaborator behind the [`submit::SubmissionBackend`] seam
//! - [`config`] - TOML configuration for storage paths and endpoints
//!
//! The store is an explicitly constructed instance owned by the entry
//! point and passed by reference to whoever needs it; there is no ambient
//! singleton. Collaborators receive immutable draft snapshots and return
//! values; only the store mutates session state.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::float_cmp)]

pub mod ai;
pub mod config;
pub mod form;
pub mod persistence;
pub mod submit;

pub use ai::{
    CredentialChain, CredentialError, GenerationClient, SecretValue, SuggestionError,
    SuggestionState, SuggestionWorkflow, TextGenerator,
};
pub use config::Config;
pub use form::{
    ApplicationDraft, ErrorKey, FieldValue, Language, SubmissionStatus, ValidationErrors,
    WizardStore, TOTAL_STEPS,
};
pub use persistence::{DraftStorage, JsonFileStorage, MemoryStorage, SavedDraft};
pub use submit::{
    HttpBackend, SubmissionBackend, SubmissionError, SubmissionPayload, SubmissionPipeline,
    SubmissionReceipt, SubmissionResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "supportflow";
