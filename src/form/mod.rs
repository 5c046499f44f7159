//! The wizard core: form configuration, draft data, validation, and the
//! session state machine.

mod draft;
pub mod schema;
mod store;
pub mod validation;

pub use draft::{ApplicationDraft, FieldValue};
pub use schema::{FieldDefinition, FieldKind, StepDefinition, TOTAL_STEPS};
pub use store::{Language, SubmissionStatus, WizardStore};
pub use validation::{ErrorKey, ValidationErrors};
