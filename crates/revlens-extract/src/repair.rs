//! Repair pipeline for malformed generative JSON.
//!
//! Models asked for JSON still emit markdown fences, leading/trailing
//! commentary, and trailing commas. The pipeline is: fence-strip →
//! brace-slice → trailing-comma fix → parse. Each step is lossless for
//! well-formed input.

use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Remove markdown code-fence markers.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", " ").replace("```", " ")
}

/// Slice from the first `{` to the last `}`, dropping any commentary the
/// model emitted around the object.
pub fn slice_to_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Remove trailing commas immediately preceding a closing brace/bracket.
pub fn strip_trailing_commas(text: &str) -> String {
    TRAILING_COMMA_RE.replace_all(text, "$1").into_owned()
}

/// Produce the best-effort JSON candidate from a raw model response.
/// Returns `None` when no brace-delimited object can be located.
pub fn extract_candidate(raw: &str) -> Option<String> {
    let unfenced = strip_code_fences(raw.trim());
    let sliced = slice_to_braces(&unfenced)?;
    Some(strip_trailing_commas(sliced))
}

/// Run the full repair pipeline and parse the candidate.
pub fn repair_and_parse(raw: &str) -> Option<serde_json::Value> {
    let candidate = extract_candidate(raw)?;
    serde_json::from_str(&candidate).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fenced_json_parses() {
        let raw = "```json\n{\"mentioned_aspects\": [{\"aspect\": \"delivery_time\", \"evidence\": \"late\"}]}\n```";
        let value = repair_and_parse(raw).unwrap();
        assert_eq!(
            value,
            json!({"mentioned_aspects": [{"aspect": "delivery_time", "evidence": "late"}]})
        );
    }

    #[test]
    fn commentary_and_trailing_comma_repaired() {
        let raw = "Sure! ```json {\"a\":1,} ``` thanks";
        let value = repair_and_parse(raw).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn trailing_commas_in_arrays_and_objects() {
        let fixed = strip_trailing_commas("{\"a\": [1, 2,], \"b\": {\"c\": 3,},}");
        assert_eq!(fixed, "{\"a\": [1, 2], \"b\": {\"c\": 3}}");
    }

    #[test]
    fn well_formed_input_unchanged() {
        let raw = "{\"a\": \"x, y\", \"b\": [1]}";
        let value = repair_and_parse(raw).unwrap();
        assert_eq!(value, json!({"a": "x, y", "b": [1]}));
    }

    #[test]
    fn no_object_yields_none() {
        assert!(extract_candidate("I could not produce any output.").is_none());
        assert!(repair_and_parse("").is_none());
    }

    #[test]
    fn unbalanced_garbage_fails_parse_not_panic() {
        assert!(repair_and_parse("{\"a\": ").is_none());
        assert!(repair_and_parse("} nonsense {").is_none());
    }

    #[test]
    fn slice_ignores_leading_and_trailing_text() {
        assert_eq!(
            slice_to_braces("noise {\"k\": 1} more noise"),
            Some("{\"k\": 1}")
        );
    }
}
