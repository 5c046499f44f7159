//! Prompt construction for AI-assisted drafting.
//!
//! Each suggestion request embeds a short summary of the applicant's
//! situation from the draft snapshot plus an instruction specific to the
//! field being drafted.

use crate::form::ApplicationDraft;

/// System instruction sent with every generation request.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that helps people write \
     clear, concise, and professional descriptions for government assistance applications. \
     Keep responses factual, respectful, and appropriate for official documentation.";

/// Build the user prompt for one field from a draft snapshot.
pub fn prompt_for_field(field_id: &str, draft: &ApplicationDraft) -> String {
    let base = format!(
        "I am applying for financial assistance. My situation: Employment status: {}, \
         Monthly income: ${}, Marital status: {}, Dependents: {}.",
        draft.display("employmentStatus"),
        draft.display("monthlyIncome"),
        draft.display("maritalStatus"),
        draft.display("dependents"),
    );

    let instruction = match field_id {
        "currentFinancialSituation" => {
            "Help me describe my current financial situation and challenges."
        }
        "employmentCircumstances" => {
            "Help me describe my employment circumstances and work situation."
        }
        "reasonForApplying" => "Help me explain my reason for applying for financial assistance.",
        _ => "Help me write a description for my application.",
    };

    format!("{base} {instruction}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ApplicationDraft {
        let mut draft = ApplicationDraft::initial();
        draft.set("employmentStatus", "unemployed".into());
        draft.set("monthlyIncome", "1200".into());
        draft.set("maritalStatus", "married".into());
        draft.set("dependents", "3".into());
        draft
    }

    #[test]
    fn test_prompt_embeds_applicant_summary() {
        let prompt = prompt_for_field("currentFinancialSituation", &snapshot());
        assert!(prompt.contains("Employment status: unemployed"));
        assert!(prompt.contains("Monthly income: $1200"));
        assert!(prompt.contains("Marital status: married"));
        assert!(prompt.contains("Dependents: 3"));
        assert!(prompt.contains("current financial situation"));
    }

    #[test]
    fn test_each_field_gets_its_own_instruction() {
        let snapshot = snapshot();
        let a = prompt_for_field("currentFinancialSituation", &snapshot);
        let b = prompt_for_field("employmentCircumstances", &snapshot);
        let c = prompt_for_field("reasonForApplying", &snapshot);
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_unknown_field_gets_generic_instruction() {
        let prompt = prompt_for_field("somethingElse", &snapshot());
        assert!(prompt.contains("write a description for my application"));
    }
}
