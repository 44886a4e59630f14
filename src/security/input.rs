//! Form input sanitizing and field rules.

use std::collections::BTreeMap;

/// Trim, drop backslash escapes and HTML-escape.
pub fn sanitize_string(input: &str) -> String {
    escape_html(&strip_slashes(input.trim()))
}

/// Keep only characters that may appear in an email address.
pub fn sanitize_email(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~@.[]".contains(*c))
        .collect()
}

/// Structural check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(input: &str) -> bool {
    let Some((local, domain)) = input.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
        && !input.chars().any(char::is_whitespace)
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

fn strip_slashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// How a field is cleaned before checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sanitize {
    #[default]
    None,
    String,
    Email,
}

/// Constraints on one form field.
#[derive(Debug, Clone, Default)]
pub struct FieldRule {
    pub sanitize: Sanitize,
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub email: bool,
}

/// Cleaned values plus one message per failing field.
#[derive(Debug, Default)]
pub struct Validated {
    pub data: BTreeMap<String, String>,
    pub errors: BTreeMap<String, String>,
}

impl Validated {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Apply `rules` to `input`, reporting every failing field.
pub fn validate_fields(
    input: &BTreeMap<String, String>,
    rules: &[(&str, FieldRule)],
) -> Validated {
    let mut result = Validated::default();

    for (field, rule) in rules {
        let raw = input.get(*field).map(String::as_str).unwrap_or("");
        let value = match rule.sanitize {
            Sanitize::None => raw.to_string(),
            Sanitize::String => sanitize_string(raw),
            Sanitize::Email => sanitize_email(raw),
        };
        let label = capitalize(field);

        if rule.required && value.is_empty() {
            result.errors.insert(field.to_string(), format!("{label} is required."));
            continue;
        }

        if !value.is_empty() {
            let len = value.chars().count();
            if let Some(min) = rule.min_length.filter(|min| len < *min) {
                result
                    .errors
                    .insert(field.to_string(), format!("{label} must be at least {min} characters."));
            }
            if let Some(max) = rule.max_length.filter(|max| len > *max) {
                result
                    .errors
                    .insert(field.to_string(), format!("{label} must be less than {max} characters."));
            }
            if rule.email && !is_valid_email(&value) {
                result
                    .errors
                    .insert(field.to_string(), format!("{label} must be a valid email address."));
            }
        }

        result.data.insert(field.to_string(), value);
    }

    result
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
