//! Parses LLM output into the structured shapes the analyzer and chat
//! service expect, tolerating extraneous prose or code fences around the
//! JSON object.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());

/// Strips a surrounding ```json fence``` if present, otherwise returns the
/// input unchanged.
fn strip_code_fence(raw: &str) -> String {
    if let Some(caps) = CODE_FENCE.captures(raw) {
        return caps[1].to_string();
    }
    raw.to_string()
}

/// Finds the first balanced `{...}` span in `raw`, tolerating leading or
/// trailing prose around it.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Attempts to parse `raw` as `T`, stripping code fences and surrounding
/// prose first. This is the "attempt to parse, and on extraneous prose or
/// fences, strip and retry" step; it is not itself the repair-prompt retry.
pub fn try_parse<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    if let Ok(v) = serde_json::from_str::<T>(raw.trim()) {
        return Ok(v);
    }

    let defenced = strip_code_fence(raw);
    if let Ok(v) = serde_json::from_str::<T>(defenced.trim()) {
        return Ok(v);
    }

    if let Some(obj) = extract_json_object(&defenced) {
        if let Ok(v) = serde_json::from_str::<T>(obj) {
            return Ok(v);
        }
    }

    Err(format!("could not parse model output as JSON: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        a: i32,
        b: String,
    }

    #[test]
    fn parses_clean_json() {
        let parsed: Sample = try_parse(r#"{"a": 1, "b": "x"}"#).unwrap();
        assert_eq!(parsed, Sample { a: 1, b: "x".to_string() });
    }

    #[test]
    fn strips_code_fences() {
        let raw = "```json\n{\"a\": 2, \"b\": \"y\"}\n```";
        let parsed: Sample = try_parse(raw).unwrap();
        assert_eq!(parsed, Sample { a: 2, b: "y".to_string() });
    }

    #[test]
    fn strips_surrounding_prose() {
        let raw = "Sure, here is the JSON:\n{\"a\": 3, \"b\": \"z\"}\nLet me know if you need more.";
        let parsed: Sample = try_parse(raw).unwrap();
        assert_eq!(parsed, Sample { a: 3, b: "z".to_string() });
    }

    #[test]
    fn fails_on_genuinely_malformed_output() {
        let result: Result<Sample, _> = try_parse("<<not json>>");
        assert!(result.is_err());
    }

    #[test]
    fn handles_braces_inside_string_values() {
        let raw = r#"{"a": 4, "b": "has a { brace } inside"}"#;
        let parsed: Sample = try_parse(raw).unwrap();
        assert_eq!(parsed.b, "has a { brace } inside");
    }
}
