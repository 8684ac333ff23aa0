//! `{{name}}` placeholder handling shared by the API handlers and the client.
//!
//! The variable list is stored next to the prompt as a comma-space joined
//! string. It is always derived from the prompt text and is never deduplicated:
//! a placeholder used twice shows up twice.

use crate::error::{PromptError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{.*?\}\}").expect("placeholder pattern is valid"));

const VARIABLE_SEPARATOR: &str = ", ";

/// Scans `text` for `{{name}}` placeholders and returns their trimmed names
/// joined with `", "`, in order of appearance. Empty placeholders are skipped.
pub fn extract_variables(text: &str) -> String {
    PLACEHOLDER
        .find_iter(text)
        .map(|m| strip_braces(m.as_str()).trim())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(VARIABLE_SEPARATOR)
}

fn strip_braces(placeholder: &str) -> &str {
    let inner = placeholder.strip_prefix("{{").unwrap_or(placeholder);
    inner.strip_suffix("}}").unwrap_or(inner)
}

/// Splits a stored variable list back into names.
pub fn required_variables(variables: &str) -> Vec<String> {
    variables
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Substitutes every `{{key}}` in `prompt` with its value.
///
/// Fails with [`PromptError::MissingVariables`] when a name listed in
/// `variables` has no entry in `values`. Keys not listed are still
/// substituted; they simply match nothing when unused.
pub fn format_prompt(prompt: &str, variables: &str, values: &BTreeMap<String, String>) -> Result<String> {
    let required = required_variables(variables);
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !values.contains_key(name.as_str()))
        .cloned()
        .collect();

    if !missing.is_empty() {
        return Err(PromptError::MissingVariables { missing, required });
    }

    let mut formatted = prompt.to_string();
    for (key, value) in values {
        let placeholder = format!("{{{{{key}}}}}");
        formatted = formatted.replace(&placeholder, value);
    }
    Ok(formatted)
}

/// A published prompt as served by `/api/prompt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub prompt: String,
    #[serde(default)]
    pub variables: String,
}

impl Prompt {
    /// Wraps `prompt` and derives its variable list.
    pub fn new(prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        let variables = extract_variables(&prompt);
        Self { prompt, variables }
    }

    pub fn required_variables(&self) -> Vec<String> {
        required_variables(&self.variables)
    }

    pub fn format(&self, values: &BTreeMap<String, String>) -> Result<String> {
        format_prompt(&self.prompt, &self.variables, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn text_without_placeholders_has_no_variables() {
        assert_eq!(extract_variables(""), "");
        assert_eq!(extract_variables("You are a helpful assistant.\nBe brief."), "");
        assert_eq!(extract_variables("single { brace } only"), "");
    }

    #[test]
    fn names_are_trimmed_and_kept_in_order() {
        assert_eq!(extract_variables("Hi {{ name }}, bye {{  place }}"), "name, place");
    }

    #[test]
    fn empty_and_unterminated_placeholders_are_ignored() {
        assert_eq!(extract_variables("{{}} {{   }} plain {{x}}"), "x");
        assert_eq!(extract_variables("open {{never closed\n{{y}}"), "y");
    }

    #[test]
    fn matching_is_non_greedy() {
        assert_eq!(extract_variables("{{a}} and {{b}}"), "a, b");
        assert_eq!(extract_variables("{{a}}}"), "a");
    }

    #[test]
    fn placeholders_do_not_span_lines() {
        assert_eq!(extract_variables("{{first\nsecond}} {{third}}"), "third");
    }

    #[test]
    fn repeated_names_are_not_deduplicated() {
        assert_eq!(extract_variables("{{x}} then {{x}} and {{ y }}"), "x, x, y");
    }

    #[test]
    fn names_may_contain_any_characters() {
        assert_eq!(extract_variables("{{user.first-name}} {{ 42 }}"), "user.first-name, 42");
    }

    #[test]
    fn required_variables_split_and_trim() {
        assert_eq!(required_variables("a, b,c ,, "), vec!["a", "b", "c"]);
        assert!(required_variables("").is_empty());
    }

    #[test]
    fn format_substitutes_values() {
        let out = format_prompt("Hello {{a}} and {{b}}", "a, b", &values(&[("a", "1"), ("b", "2")])).unwrap();
        assert_eq!(out, "Hello 1 and 2");
    }

    #[test]
    fn format_reports_missing_and_required_variables() {
        let err = format_prompt("Hello {{a}} and {{b}}", "a, b", &values(&[("a", "1")])).unwrap_err();
        match &err {
            PromptError::MissingVariables { missing, required } => {
                assert_eq!(missing, &vec!["b".to_string()]);
                assert_eq!(required, &vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("Missing required variables: b."));
        assert!(message.contains("All required variables: a, b"));
    }

    #[test]
    fn format_replaces_every_occurrence() {
        let out = format_prompt("{{x}}-{{x}}", "x", &values(&[("x", "Z")])).unwrap();
        assert_eq!(out, "Z-Z");
    }

    #[test]
    fn duplicate_required_names_are_satisfied_by_one_value() {
        let out = format_prompt("{{x}} {{x}}", "x, x", &values(&[("x", "ok")])).unwrap();
        assert_eq!(out, "ok ok");
    }

    #[test]
    fn extra_values_are_harmless() {
        let out = format_prompt("Hi {{name}}", "name", &values(&[("name", "Ada"), ("unused", "?")])).unwrap();
        assert_eq!(out, "Hi Ada");
    }

    #[test]
    fn keys_are_matched_literally() {
        let out = format_prompt("{{a.b}} {{a+b}}", "a.b, a+b", &values(&[("a.b", "dot"), ("a+b", "plus")])).unwrap();
        assert_eq!(out, "dot plus");
    }

    #[test]
    fn spaced_placeholders_only_match_exact_keys() {
        // Extraction trims, substitution does not.
        let prompt = Prompt::new("Hi {{ name }}");
        assert_eq!(prompt.variables, "name");
        assert_eq!(prompt.format(&values(&[("name", "Ada")])).unwrap(), "Hi {{ name }}");
    }

    #[test]
    fn prompt_round_trips_through_json() {
        let prompt: Prompt = serde_json::from_str(r#"{"prompt":"Hi {{n}}","variables":"n"}"#).unwrap();
        assert_eq!(prompt.required_variables(), vec!["n"]);
        assert_eq!(prompt.format(&values(&[("n", "there")])).unwrap(), "Hi there");
    }
}
