use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

use crate::error::AuthError;

const USER_AGENT: &str = concat!("xblive/", env!("CARGO_PKG_VERSION"));

/// Builder with the crate's user agent and the configured timeout.
pub(crate) fn client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
}

/// Build an HTTP client with the configured timeout.
///
/// Clients that share `jar` share cookies; the sign-in flow needs that to
/// carry the page's session cookies into the credential POST.
pub(crate) fn build_client(
    timeout: Duration,
    jar: Option<Arc<Jar>>,
    follow_redirects: bool,
) -> Result<reqwest::Client, AuthError> {
    let mut builder = client_builder(timeout);
    if let Some(jar) = jar {
        builder = builder.cookie_provider(jar);
    }
    if !follow_redirects {
        builder = builder.redirect(reqwest::redirect::Policy::none());
    }
    Ok(builder.build()?)
}

/// `application/x-www-form-urlencoded` encoding of `pairs`, also used for query strings.
pub(crate) fn form_encode(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Turn a 5xx status into a transport error; everything else passes through.
pub(crate) fn reject_server_error(
    response: reqwest::Response,
) -> Result<reqwest::Response, AuthError> {
    if response.status().is_server_error() {
        return Err(response.error_for_status().map_or_else(
            AuthError::Transport,
            |r| AuthError::MalformedResponse(format!("unexpected status {}", r.status())),
        ));
    }
    Ok(response)
}

/// Decode `key=value&...` pairs, as found in query strings and URL fragments.
///
/// `+` decodes to a space. Pairs without `=` are kept with an empty value.
pub(crate) fn decode_pairs(encoded: &str) -> Result<Vec<(String, String)>, AuthError> {
    encoded
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Ok((decode_component(key)?, decode_component(value)?))
        })
        .collect()
}

fn decode_component(raw: &str) -> Result<String, AuthError> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| AuthError::MalformedResponse(format!("URL decode: {e}")))
}
