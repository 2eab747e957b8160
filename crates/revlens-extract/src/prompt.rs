//! Extraction prompt rendering.
//!
//! The prompt carries the vertical's allowed vocabulary and ownership map
//! so the model has no excuse to invent aspects; the guardrail still
//! enforces the whitelist afterwards. Bump [`PROMPT_VERSION`] whenever the
//! wording changes so re-analysis runs are auditable.

use std::fmt::Write as _;

use revlens_taxonomy::VerticalView;

/// Revision tag recorded as `prompt_version` on every enriched row.
pub const PROMPT_VERSION: &str = "v1";

/// Appended verbatim on the single retry after a parse failure.
pub const STRICT_OUTPUT_DIRECTIVE: &str = "IMPORTANT: Respond with a single JSON object only. \
No markdown, no code fences, no commentary before or after the object. \
All string values must use properly escaped double quotes.";

/// Render the extraction instruction for one review.
pub fn render_extraction_prompt(vertical_key: &str, view: &VerticalView, review_text: &str) -> String {
    let mut aspects = String::new();
    for aspect in &view.allowed {
        let owner = view
            .aspect_to_stakeholder
            .get(aspect)
            .map(String::as_str)
            .unwrap_or("product");
        let _ = writeln!(aspects, "- {} (owner: {})", aspect, owner);
    }

    format!(
        "You are an analyst for the \"{vertical}\" vertical of a consumer delivery app. \
Read the customer review below and extract every aspect it mentions.\n\
\n\
Allowed aspects (use these exact identifiers, nothing else):\n\
{aspects}\n\
Return a JSON object with this shape:\n\
{{\n\
  \"mentioned_aspects\": [\n\
    {{\"aspect\": \"<allowed identifier>\", \"stakeholder\": \"<owner team>\", \
\"evidence\": \"<verbatim quote from the review>\", \"confidence\": <0.0-1.0>}}\n\
  ],\n\
  \"unmapped_issues\": [\n\
    {{\"issue\": \"<short tag>\", \"evidence\": \"<verbatim quote>\", \"confidence\": <0.0-1.0>}}\n\
  ]\n\
}}\n\
\n\
Mention an aspect only when the review gives evidence for it. Issues that fit \
no allowed aspect go under \"unmapped_issues\". Output JSON only.\n\
\n\
Review:\n\
\"\"\"\n\
{text}\n\
\"\"\"",
        vertical = vertical_key,
        aspects = aspects,
        text = review_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use revlens_taxonomy::TaxonomyConfig;

    fn view() -> revlens_taxonomy::VerticalView {
        TaxonomyConfig::from_str(
            r#"{
                "global_aspects": ["delivery_time"],
                "global_stakeholders": {"logistics": ["delivery_time"]},
                "verticals": {"food": {"aspects": ["food_quality"]}}
            }"#,
        )
        .unwrap()
        .effective("food")
    }

    #[test]
    fn prompt_lists_every_allowed_aspect_with_owner() {
        let prompt = render_extraction_prompt("food", &view(), "the rice was cold");
        assert!(prompt.contains("- delivery_time (owner: logistics)"));
        assert!(prompt.contains("- food_quality (owner: product)"));
        assert!(prompt.contains("the rice was cold"));
        assert!(prompt.contains("\"food\" vertical"));
    }

    #[test]
    fn prompt_demands_json_shape() {
        let prompt = render_extraction_prompt("food", &view(), "x");
        assert!(prompt.contains("\"mentioned_aspects\""));
        assert!(prompt.contains("\"unmapped_issues\""));
    }
}
