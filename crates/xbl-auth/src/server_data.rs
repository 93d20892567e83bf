//! Extraction of script-embedded objects from identity-provider HTML pages.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::AuthError;
use crate::relaxed_json;

/// `value` attribute of the first `<input>` element in a fragment.
static INPUT_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<input\b[^>]*?\svalue\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#)
        .unwrap_or_else(|e| panic!("invalid input value regex: {e}"))
});

/// The parts of the sign-in page's `ServerData` object the credential POST needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerData {
    /// Anti-forgery value from the hidden `PPFT` input.
    pub ppft: String,
    /// Absolute URL the credentials are posted to.
    pub url_post: String,
    /// The whole decoded object, passed to two-factor handlers.
    pub raw: Value,
}

impl ServerData {
    pub const OBJECT_NAME: &'static str = "ServerData";

    /// Locate and decode `ServerData` in a sign-in page.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedResponse` if the object, its `sFTTag`
    /// input value, or its `urlPost` is missing.
    pub fn from_page(html: &str) -> Result<Self, AuthError> {
        let raw = extract_js_object(html, Self::OBJECT_NAME)?.ok_or_else(|| {
            AuthError::MalformedResponse("sign-in page has no ServerData object".into())
        })?;
        Self::from_value(raw)
    }

    /// Pull the required fields out of an already decoded object.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedResponse` if a required field is missing.
    pub fn from_value(raw: Value) -> Result<Self, AuthError> {
        let tag = raw
            .get("sFTTag")
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::MalformedResponse("ServerData has no sFTTag".into()))?;
        let ppft = input_value(tag).ok_or_else(|| {
            AuthError::MalformedResponse("sFTTag has no input value attribute".into())
        })?;
        let url_post = raw
            .get("urlPost")
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::MalformedResponse("ServerData has no urlPost".into()))?
            .to_string();
        Ok(Self {
            ppft,
            url_post,
            raw,
        })
    }
}

/// Find the object literal assigned to `name` in `body` and decode it.
///
/// Matches `name`, then the next `=`, then the next `{`, case-insensitively and
/// across lines; the object ends at the matching `}`. Returns `Ok(None)` when
/// `name` is not assigned anywhere in `body`.
///
/// # Errors
///
/// Returns `AuthError::MalformedResponse` if the object is unbalanced or
/// cannot be decoded.
pub fn extract_js_object(body: &str, name: &str) -> Result<Option<Value>, AuthError> {
    let pattern = format!(r"(?is){}.*?=.*?\{{", regex::escape(name));
    let locator = Regex::new(&pattern)
        .map_err(|e| AuthError::MalformedResponse(format!("cannot search for {name}: {e}")))?;
    let Some(found) = locator.find(body) else {
        return Ok(None);
    };

    let open = found.end() - 1;
    let literal = balanced_object(&body[open..]).ok_or_else(|| {
        AuthError::MalformedResponse(format!("{name} object is not terminated"))
    })?;
    relaxed_json::parse(literal)
        .map(Some)
        .map_err(|e| AuthError::MalformedResponse(format!("{name}: {e}")))
}

/// Whether `body` assigns an object to `name`.
#[must_use]
pub fn has_js_object(body: &str, name: &str) -> bool {
    let pattern = format!(r"(?is){}.*?=.*?\{{", regex::escape(name));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(body))
}

/// The `value` attribute of the first `<input>` tag in `fragment`, entity-decoded.
#[must_use]
pub fn input_value(fragment: &str) -> Option<String> {
    let caps = INPUT_VALUE.captures(fragment)?;
    let raw = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
    Some(decode_entities(raw.as_str()))
}

/// Prefix of `text` (which starts with `{`) up to and including the matching `}`.
/// Braces inside string literals do not count.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (index, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=index]);
                }
            }
            _ => {}
        }
    }
    None
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
