//! Template rendering: `{{variable}}` substitution plus markdown-to-HTML
//! for the outgoing email body.

use std::collections::HashMap;

use lazy_static::lazy_static;
use pulldown_cmark::{html, Parser};
use regex::Regex;

use crate::common::ApiError;

lazy_static! {
    static ref VARIABLE_RE: Regex =
        Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}").expect("variable regex is valid");
}

/// The rendered output of a template for one recipient.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub subject: String,
    /// Substituted markdown - used as the plain-text email part
    pub text_body: String,
    /// Markdown rendered to HTML
    pub html_body: String,
}

/// Extract the distinct variable names used in a template body or subject,
/// in order of first appearance.
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for capture in VARIABLE_RE.captures_iter(text) {
        let name = capture[1].to_string();
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

/// Substitute `{{variable}}` placeholders from the context map.
///
/// Every placeholder must be present in the context; unknown context keys
/// are ignored.
pub fn substitute(text: &str, context: &HashMap<String, String>) -> Result<String, ApiError> {
    let mut missing = Vec::new();
    let result = VARIABLE_RE.replace_all(text, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match context.get(name) {
            Some(value) => value.clone(),
            None => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Missing template variables: {}",
            missing.join(", ")
        )));
    }

    Ok(result.into_owned())
}

/// Render subject + body against a context map.
pub fn render(
    subject: &str,
    body: &str,
    context: &HashMap<String, String>,
) -> Result<Rendered, ApiError> {
    let subject = substitute(subject, context)?;
    let text_body = substitute(body, context)?;

    let mut html_body = String::new();
    html::push_html(&mut html_body, Parser::new(&text_body));

    Ok(Rendered {
        subject,
        text_body,
        html_body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_variables() {
        let body = "Hi {{contact_name}}, check out {{ track_name }} - {{contact_name}} again";
        assert_eq!(
            extract_variables(body),
            vec!["contact_name".to_string(), "track_name".to_string()]
        );
    }

    #[test]
    fn test_extract_ignores_malformed() {
        assert!(extract_variables("no vars {single brace} {{123bad}}").is_empty());
    }

    #[test]
    fn test_substitute() {
        let result = substitute(
            "Hi {{name}}, from {{sender}}",
            &context(&[("name", "Jo"), ("sender", "The Band")]),
        )
        .unwrap();
        assert_eq!(result, "Hi Jo, from The Band");
    }

    #[test]
    fn test_substitute_missing_variable_errors() {
        let err = substitute("Hi {{name}}", &context(&[])).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_substitute_ignores_extra_context() {
        let result = substitute("plain text", &context(&[("unused", "x")])).unwrap();
        assert_eq!(result, "plain text");
    }

    #[test]
    fn test_render_produces_html() {
        let rendered = render(
            "New single from {{artist}}",
            "# Hello {{name}}\n\nStream it **now**.",
            &context(&[("artist", "Velvet Static"), ("name", "Jo")]),
        )
        .unwrap();

        assert_eq!(rendered.subject, "New single from Velvet Static");
        assert!(rendered.text_body.starts_with("# Hello Jo"));
        assert!(rendered.html_body.contains("<h1>Hello Jo</h1>"));
        assert!(rendered.html_body.contains("<strong>now</strong>"));
    }
}
