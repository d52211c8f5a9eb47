//! Placeholder templating
//!
//! Placeholders are plain tokens such as `__MODULE_NAME` replaced textually.
//! Any `__UPPER_CASE` token in the template counts as a placeholder.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::errors::TemplateError;

/// Placeholder token to replacement value
pub type Placeholders = BTreeMap<String, String>;

/// Result of a successful render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// The concrete document
    pub document: String,

    /// Mapping keys that did not occur in the template
    pub unused: Vec<String>,
}

/// Replace every placeholder in `template`.
///
/// A mapping key missing from the template is logged as a warning, or
/// rejected when `strict` is set. Empty values, values carrying a
/// placeholder token and template tokens with no mapping entry are always
/// errors. Values are copied into the document verbatim.
pub fn render(template: &str, mapping: &Placeholders, strict: bool) -> Result<Rendered, TemplateError> {
    for (key, value) in mapping {
        if value.is_empty() {
            return Err(TemplateError::EmptyValue(key.clone()));
        }
        if carries_token(value, mapping) {
            return Err(TemplateError::TokenInValue(key.clone()));
        }
    }

    let mut unused = Vec::new();
    for key in mapping.keys() {
        if !template.contains(key.as_str()) {
            if strict {
                return Err(TemplateError::UnusedPlaceholder(key.clone()));
            }
            warn!("Placeholder {} does not occur in the template, is it stale?", key);
            unused.push(key.clone());
        }
    }

    if let Some(token) = placeholder_tokens(template)
        .into_iter()
        .find(|token| !mapping.contains_key(token))
    {
        return Err(TemplateError::UnresolvedToken(token));
    }

    let document = substitute(template, mapping);
    if let Some(token) = placeholder_tokens(&document).into_iter().next() {
        return Err(TemplateError::UnresolvedToken(token));
    }

    Ok(Rendered { document, unused })
}

/// One left-to-right pass; at each position the longest matching key wins
/// and the text it inserts is never scanned again
fn substitute(template: &str, mapping: &Placeholders) -> String {
    let mut keys: Vec<&String> = mapping.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut document = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(ch) = rest.chars().next() {
        if let Some(key) = keys.iter().find(|key| rest.starts_with(key.as_str())) {
            document.push_str(&mapping[*key]);
            rest = &rest[key.len()..];
        } else {
            document.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    document
}

/// True when `value` holds a mapping key or anything shaped like `__UPPER`
fn carries_token(value: &str, mapping: &Placeholders) -> bool {
    mapping.keys().any(|key| value.contains(key.as_str()))
        || value
            .as_bytes()
            .windows(3)
            .any(|w| w[0] == b'_' && w[1] == b'_' && w[2].is_ascii_uppercase())
}

/// Collect every `__UPPER_CASE` token in `text`
pub fn placeholder_tokens(text: &str) -> BTreeSet<String> {
    let bytes = text.as_bytes();
    let mut tokens = BTreeSet::new();
    let mut i = 0;
    while i + 2 < bytes.len() {
        let starts_token = bytes[i] == b'_'
            && bytes[i + 1] == b'_'
            && bytes[i + 2].is_ascii_uppercase()
            && (i == 0 || !(bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_'));
        if !starts_token {
            i += 1;
            continue;
        }
        let mut end = i + 2;
        while end < bytes.len() && is_token_byte(bytes[end]) {
            end += 1;
        }
        // Trailing underscores belong to the surrounding text, not the token
        let mut token_end = end;
        while token_end > i + 3 && bytes[token_end - 1] == b'_' {
            token_end -= 1;
        }
        tokens.insert(text[i..token_end].to_string());
        i = end;
    }
    tokens
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_'
}
