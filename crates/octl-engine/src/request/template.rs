//! Output-piping placeholder resolution: `{{.Path.To.Field}}` tokens
//! resolved against a previous command's captured output (§EXPANSION 3,
//! the "Chaining works" scenario / §8 scenario 5).
//!
//! The same substitution pass serves both the `--template` file/stdin JSON
//! base (§4.6 step 3) and individual flag values supplied directly on the
//! command line (`--NetId {{.Net.NetId}}`) — nothing restricts placeholders
//! to template bodies alone.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{\.([A-Za-z0-9_.]+)\}\}").expect("valid regex"))
}

/// Replaces every `{{.Path}}` occurrence in `text` with the scalar found at
/// `Path` in `chain_input`. A placeholder with no matching chain input, or
/// one resolving to a non-scalar or absent field, is a request-build error.
pub fn substitute(text: &str, chain_input: Option<&Value>) -> Result<String> {
    if !text.contains("{{.") {
        return Ok(text.to_string());
    }
    let mut failure: Option<String> = None;
    let replaced = placeholder_pattern().replace_all(text, |caps: &regex::Captures| {
        let path = &caps[1];
        match chain_input.and_then(|v| lookup_dotted(v, path)) {
            Some(value) => render_scalar(value),
            None => {
                failure.get_or_insert_with(|| path.to_string());
                String::new()
            }
        }
    });
    if let Some(path) = failure {
        return Err(Error::RequestBuild(format!(
            "placeholder {{{{.{path}}}}} did not resolve against chained input"
        )));
    }
    Ok(replaced.into_owned())
}

/// Decodes a `--template` file's or stdin's text as the JSON base record
/// (§4.6 step 1), resolving any placeholders against `chain_input` first
/// (§4.6 step 3).
pub fn decode_base(text: &str, chain_input: Option<&Value>) -> Result<Value> {
    let resolved = substitute(text, chain_input)?;
    serde_json::from_str(&resolved).map_err(|e| Error::RequestBuild(format!("invalid JSON body: {e}")))
}

fn lookup_dotted<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = if let Ok(index) = segment.parse::<usize>() {
            current.as_array()?.get(index)?
        } else {
            current.as_object()?.get(segment)?
        };
    }
    Some(current)
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn substitutes_nested_path() {
        let chain = json!({"Net": {"NetId": "net-00000001"}});
        let result = substitute("NetId is {{.Net.NetId}}", Some(&chain)).unwrap();
        assert_eq!(result, "NetId is net-00000001");
    }

    #[test]
    fn leaves_text_without_placeholders_untouched() {
        let result = substitute("plain text", None).unwrap();
        assert_eq!(result, "plain text");
    }

    #[test]
    fn unresolved_placeholder_is_an_error() {
        let err = substitute("{{.Missing.Field}}", Some(&json!({}))).unwrap_err();
        assert!(matches!(err, Error::RequestBuild(_)));
    }

    #[test]
    fn decodes_template_body_after_substitution() {
        let chain = json!({"Net": {"NetId": "net-1"}});
        let value = decode_base(r#"{"NetId": "{{.Net.NetId}}", "IpRange": "10.0.1.0/24"}"#, Some(&chain)).unwrap();
        assert_eq!(value["NetId"], json!("net-1"));
    }
}
