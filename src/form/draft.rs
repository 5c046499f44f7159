//! The in-progress application draft.
//!
//! A draft is a mapping from field id to value, closed over the configured
//! schema: every known field id is always present, and ids the schema does
//! not declare are never merged in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::schema;

/// A single field value as it appears on the wire: a string or a number.
///
/// An empty string (or a numeric NaN) counts as "no value entered yet".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric value (number-typed inputs may persist as JSON numbers).
    Number(f64),
    /// Text value; the common case for every input kind.
    Text(String),
}

impl FieldValue {
    /// The empty value every field starts out with.
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    /// Whether this value counts as missing for required-field checks.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(t) => t.trim().is_empty(),
            FieldValue::Number(n) => n.is_nan(),
        }
    }

    /// Render the value for display and prompt construction.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(t) => t.clone(),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

/// The citizen's in-progress application data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationDraft {
    values: BTreeMap<String, FieldValue>,
}

impl ApplicationDraft {
    /// The initial draft: every configured field id mapped to an empty value.
    pub fn initial() -> Self {
        let values =
            schema::all_fields().map(|f| (f.id.to_string(), FieldValue::empty())).collect();
        Self { values }
    }

    /// Get a field's current value. `None` only for ids the schema does not
    /// declare.
    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    /// Render a field's value for display; empty string for unknown ids.
    pub fn display(&self, field_id: &str) -> String {
        self.get(field_id).map(FieldValue::display).unwrap_or_default()
    }

    /// Set a known field's value. Returns `false` (and leaves the draft
    /// untouched) for ids the schema does not declare.
    pub fn set(&mut self, field_id: &str, value: FieldValue) -> bool {
        if schema::field(field_id).is_none() {
            return false;
        }
        self.values.insert(field_id.to_string(), value);
        true
    }

    /// Merge a persisted map into this draft, keeping only known field ids.
    ///
    /// Unknown ids from a corrupted or stale blob are dropped, never merged.
    pub fn merge_known(&mut self, saved: &BTreeMap<String, FieldValue>) {
        for (id, value) in saved {
            if schema::field(id).is_some() {
                self.values.insert(id.clone(), value.clone());
            }
        }
    }

    /// Borrow the underlying map (for persistence snapshots and payloads).
    pub fn as_map(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }

    /// Whether every field is back to its empty value.
    pub fn is_blank(&self) -> bool {
        self.values.values().all(FieldValue::is_empty)
    }
}

impl Default for ApplicationDraft {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_draft_covers_every_field() {
        let draft = ApplicationDraft::initial();
        for field in schema::all_fields() {
            assert!(draft.get(field.id).is_some(), "missing {}", field.id);
        }
        assert!(draft.is_blank());
    }

    #[test]
    fn test_set_unknown_field_is_rejected() {
        let mut draft = ApplicationDraft::initial();
        assert!(!draft.set("notAField", "x".into()));
        assert!(draft.get("notAField").is_none());
    }

    #[test]
    fn test_merge_known_drops_unknown_ids() {
        let mut draft = ApplicationDraft::initial();
        let mut saved = BTreeMap::new();
        saved.insert("name".to_string(), FieldValue::from("Amal"));
        saved.insert("legacyField".to_string(), FieldValue::from("junk"));
        draft.merge_known(&saved);

        assert_eq!(draft.display("name"), "Amal");
        assert!(draft.get("legacyField").is_none());
    }

    #[test]
    fn test_empty_values() {
        assert!(FieldValue::empty().is_empty());
        assert!(FieldValue::Text("   ".into()).is_empty());
        assert!(FieldValue::Number(f64::NAN).is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
    }

    #[test]
    fn test_display_trims_integer_numbers() {
        assert_eq!(FieldValue::Number(2500.0).display(), "2500");
        assert_eq!(FieldValue::Number(2500.5).display(), "2500.5");
    }

    #[test]
    fn test_wire_shape_round_trip() {
        let mut draft = ApplicationDraft::initial();
        draft.set("name", "Amal".into());
        draft.set("dependents", FieldValue::Number(2.0));

        let json = serde_json::to_string(&draft).unwrap();
        let back: ApplicationDraft = serde_json::from_str(&json).unwrap();
        assert_eq!(back, draft);
        assert_eq!(back.get("dependents"), Some(&FieldValue::Number(2.0)));
    }
}
