//! Field and step validation.
//!
//! Pure functions mapping field values to localized error keys. Rules are
//! evaluated in precedence order per field: missing value on a required
//! field first, then the kind-specific format check. There is no cross-field
//! validation; each field is judged on its own value.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::draft::{ApplicationDraft, FieldValue};
use super::schema::{self, FieldDefinition, FieldKind};

/// Localized error key for a failed validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKey {
    /// A required field has no value.
    Required,
    /// The value does not match the field's format or bounds.
    InvalidFormat,
    /// The value is not a well-formed email address.
    EmailInvalid,
}

impl ErrorKey {
    /// The lookup key handed to the front end's string table.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKey::Required => "required",
            ErrorKey::InvalidFormat => "invalidFormat",
            ErrorKey::EmailInvalid => "emailInvalid",
        }
    }
}

/// Per-step (or whole-draft) validation outcome. Empty means valid.
pub type ValidationErrors = BTreeMap<String, ErrorKey>;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9][0-9]{0,15}$").expect("phone pattern"));

static NATIONAL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5,20}$").expect("national id pattern"));

/// Validate a single field value against its configured rules.
///
/// Returns the first failing rule's error key, or `None` when the value is
/// acceptable. Unknown field ids validate clean. The full draft is part of
/// the contract so that cross-field rules have a seam to land in, even
/// though none exist today.
pub fn validate_field(
    field_id: &str,
    value: &FieldValue,
    _draft: &ApplicationDraft,
) -> Option<ErrorKey> {
    let field = schema::field(field_id)?;

    if value.is_empty() {
        return field.required.then_some(ErrorKey::Required);
    }

    check_format(field, value)
}

fn check_format(field: &FieldDefinition, value: &FieldValue) -> Option<ErrorKey> {
    match field.kind {
        FieldKind::Text | FieldKind::Date => None,
        FieldKind::Email => match value {
            FieldValue::Text(t) if EMAIL_RE.is_match(t.trim()) => None,
            _ => Some(ErrorKey::EmailInvalid),
        },
        FieldKind::Phone => match value {
            FieldValue::Text(t) if PHONE_RE.is_match(&strip_phone_separators(t)) => None,
            _ => Some(ErrorKey::InvalidFormat),
        },
        FieldKind::NationalId => match value {
            FieldValue::Text(t) if NATIONAL_ID_RE.is_match(t.trim()) => None,
            _ => Some(ErrorKey::InvalidFormat),
        },
        FieldKind::Number { min, max } => match numeric_value(value) {
            Some(n) if (min..=max).contains(&n) => None,
            _ => Some(ErrorKey::InvalidFormat),
        },
        FieldKind::Select { options } => match value {
            FieldValue::Text(t) if options.contains(&t.as_str()) => None,
            _ => Some(ErrorKey::InvalidFormat),
        },
    }
}

fn strip_phone_separators(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')')).collect()
}

fn numeric_value(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) if n.is_finite() => Some(*n),
        FieldValue::Number(_) => None,
        FieldValue::Text(t) => t.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
    }
}

/// Validate every field of one step against the draft's current values.
///
/// The result is scoped to that step only; an empty mapping means the step
/// is valid. Unknown step positions validate clean.
pub fn validate_step(step_index: u8, draft: &ApplicationDraft) -> ValidationErrors {
    let Some(step) = schema::step(step_index) else {
        return ValidationErrors::new();
    };

    let empty = FieldValue::empty();
    step.fields
        .iter()
        .filter_map(|f| {
            let value = draft.get(f.id).unwrap_or(&empty);
            validate_field(f.id, value, draft).map(|key| (f.id.to_string(), key))
        })
        .collect()
}

/// A step is complete iff validating it produces no errors.
pub fn is_step_complete(step_index: u8, draft: &ApplicationDraft) -> bool {
    validate_step(step_index, draft).is_empty()
}

/// Validate every step of the form; used by the submission pipeline.
pub fn validate_all(draft: &ApplicationDraft) -> ValidationErrors {
    (1..=schema::TOTAL_STEPS).flat_map(|s| validate_step(s, draft)).collect()
}
