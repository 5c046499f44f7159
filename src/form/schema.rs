//! Form configuration.
//!
//! The application form is a fixed sequence of three steps. The step and
//! field definitions here are static configuration: the draft never adds or
//! removes fields, and nothing about the grouping is derived at runtime.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Number of steps in the form.
pub const TOTAL_STEPS: u8 = 3;

/// The value kind of a field, including any kind-specific constraints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Free text, no format constraint.
    Text,
    /// Text matching a local@domain email pattern.
    Email,
    /// Digits with an optional leading `+`, separators tolerated.
    Phone,
    /// 5-20 digit national identity number.
    NationalId,
    /// Calendar date supplied by a date picker.
    Date,
    /// Numeric value within inclusive bounds.
    Number { min: f64, max: f64 },
    /// One of a fixed option set.
    Select { options: &'static [&'static str] },
}

/// A single field of the form. Immutable, defined at configuration time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDefinition {
    /// Field id, also the label/error lookup key for the front end.
    pub id: &'static str,
    /// Value kind with its constraints.
    pub kind: FieldKind,
    /// Whether the field must hold a value for its step to be complete.
    pub required: bool,
}

/// An ordered group of fields presented as one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDefinition {
    /// 1-based position of the step.
    pub position: u8,
    /// Title lookup key for the front end.
    pub title_key: &'static str,
    /// Fields in display order.
    pub fields: &'static [FieldDefinition],
}

const GENDER_OPTIONS: &[&str] = &["male", "female", "other"];
const MARITAL_STATUS_OPTIONS: &[&str] = &["single", "married", "divorced", "widowed"];
const EMPLOYMENT_STATUS_OPTIONS: &[&str] =
    &["employed", "unemployed", "selfEmployed", "retired", "student"];
const HOUSING_STATUS_OPTIONS: &[&str] = &["owned", "rented", "livingWithFamily", "homeless"];

const PERSONAL_INFO_FIELDS: &[FieldDefinition] = &[
    FieldDefinition { id: "name", kind: FieldKind::Text, required: true },
    FieldDefinition { id: "nationalId", kind: FieldKind::NationalId, required: true },
    FieldDefinition { id: "dateOfBirth", kind: FieldKind::Date, required: true },
    FieldDefinition {
        id: "gender",
        kind: FieldKind::Select { options: GENDER_OPTIONS },
        required: true,
    },
    FieldDefinition { id: "address", kind: FieldKind::Text, required: true },
    FieldDefinition { id: "city", kind: FieldKind::Text, required: true },
    FieldDefinition { id: "state", kind: FieldKind::Text, required: true },
    FieldDefinition { id: "country", kind: FieldKind::Text, required: true },
    FieldDefinition { id: "phone", kind: FieldKind::Phone, required: true },
    FieldDefinition { id: "email", kind: FieldKind::Email, required: true },
];

const FAMILY_FINANCIAL_FIELDS: &[FieldDefinition] = &[
    FieldDefinition {
        id: "maritalStatus",
        kind: FieldKind::Select { options: MARITAL_STATUS_OPTIONS },
        required: true,
    },
    FieldDefinition {
        id: "dependents",
        kind: FieldKind::Number { min: 0.0, max: 20.0 },
        required: true,
    },
    FieldDefinition {
        id: "employmentStatus",
        kind: FieldKind::Select { options: EMPLOYMENT_STATUS_OPTIONS },
        required: true,
    },
    FieldDefinition {
        id: "monthlyIncome",
        kind: FieldKind::Number { min: 0.0, max: 999_999_999.0 },
        required: true,
    },
    FieldDefinition {
        id: "housingStatus",
        kind: FieldKind::Select { options: HOUSING_STATUS_OPTIONS },
        required: true,
    },
];

const SITUATION_FIELDS: &[FieldDefinition] = &[
    FieldDefinition { id: "currentFinancialSituation", kind: FieldKind::Text, required: true },
    FieldDefinition { id: "employmentCircumstances", kind: FieldKind::Text, required: true },
    FieldDefinition { id: "reasonForApplying", kind: FieldKind::Text, required: true },
];

/// The three steps of the form, in order.
pub static FORM_STEPS: &[StepDefinition] = &[
    StepDefinition { position: 1, title_key: "personalInfo", fields: PERSONAL_INFO_FIELDS },
    StepDefinition { position: 2, title_key: "familyFinancial", fields: FAMILY_FINANCIAL_FIELDS },
    StepDefinition { position: 3, title_key: "situationDescriptions", fields: SITUATION_FIELDS },
];

static FIELD_INDEX: Lazy<HashMap<&'static str, &'static FieldDefinition>> = Lazy::new(|| {
    FORM_STEPS.iter().flat_map(|s| s.fields.iter()).map(|f| (f.id, f)).collect()
});

/// Look up a step by its 1-based position.
pub fn step(position: u8) -> Option<&'static StepDefinition> {
    FORM_STEPS.iter().find(|s| s.position == position)
}

/// Look up a field definition by id.
pub fn field(id: &str) -> Option<&'static FieldDefinition> {
    FIELD_INDEX.get(id).copied()
}

/// Iterate over every field of every step, in form order.
pub fn all_fields() -> impl Iterator<Item = &'static FieldDefinition> {
    FORM_STEPS.iter().flat_map(|s| s.fields.iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_steps_in_order() {
        assert_eq!(FORM_STEPS.len(), TOTAL_STEPS as usize);
        for (i, s) in FORM_STEPS.iter().enumerate() {
            assert_eq!(s.position, i as u8 + 1);
        }
    }

    #[test]
    fn test_field_ids_are_unique() {
        let total: usize = FORM_STEPS.iter().map(|s| s.fields.len()).sum();
        assert_eq!(FIELD_INDEX.len(), total);
    }

    #[test]
    fn test_field_lookup() {
        let dependents = field("dependents").unwrap();
        assert_eq!(dependents.kind, FieldKind::Number { min: 0.0, max: 20.0 });
        assert!(field("notAField").is_none());
    }

    #[test]
    fn test_step_lookup_out_of_range() {
        assert!(step(0).is_none());
        assert!(step(TOTAL_STEPS + 1).is_none());
    }
}
