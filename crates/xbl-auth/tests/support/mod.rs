//! Local stand-ins for the identity provider and the platform, served by
//! `tiny_http` on an ephemeral port.

#![allow(dead_code)]

use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};
use xbl_config::{GeneralConfig, LiveConfig, XblConfig, XboxConfig};

pub const PASSWORD: &str = "correct-horse";
pub const GOOD_REFRESH: &str = "good-refresh";
pub const XUID: &str = "2535405290989877";
pub const USERHASH: &str = "1234567890";

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

pub struct Reply {
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
}

impl Reply {
    pub fn html(body: impl Into<String>) -> Self {
        Self::status(200, body).with_header("Content-Type", "text/html; charset=utf-8")
    }

    pub fn json(value: &Value) -> Self {
        Self::status(200, value.to_string()).with_header("Content-Type", "application/json")
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self::status(302, "").with_header("Location", location)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Serves `handler(request, base_url)` until dropped, recording every request.
pub struct FakeServer {
    server: Arc<tiny_http::Server>,
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    worker: Option<JoinHandle<()>>,
}

impl FakeServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&Recorded, &str) -> Reply + Send + Sync + 'static,
    {
        let server = Arc::new(tiny_http::Server::http("127.0.0.1:0").expect("bind fake server"));
        let port = server.server_addr().to_ip().expect("ip listener").port();
        let base_url = format!("http://127.0.0.1:{port}");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let worker = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            let base_url = base_url.clone();
            thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);
                    let recorded = Recorded {
                        method: request.method().to_string(),
                        url: request.url().to_string(),
                        headers: request
                            .headers()
                            .iter()
                            .map(|h| (h.field.to_string(), h.value.to_string()))
                            .collect(),
                        body,
                    };

                    let reply = handler(&recorded, &base_url);
                    requests.lock().expect("request log").push(recorded);

                    let mut response =
                        tiny_http::Response::from_string(reply.body).with_status_code(reply.status);
                    for (name, value) in reply.headers {
                        response.add_header(
                            tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes())
                                .expect("valid header"),
                        );
                    }
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            server,
            base_url,
            requests,
            worker: Some(worker),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("request log").clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path() == path).count()
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

// ---------------------------------------------------------------------------
// Provider behaviour
// ---------------------------------------------------------------------------

pub const AUTHORIZE_PATH: &str = "/oauth20_authorize.srf";
pub const POST_PATH: &str = "/ppsecure/post.srf";
pub const TOKEN_PATH: &str = "/oauth20_token.srf";
pub const USER_PATH: &str = "/user/authenticate";
pub const DEVICE_PATH: &str = "/device/authenticate";
pub const TITLE_PATH: &str = "/title/authenticate";
pub const XSTS_PATH: &str = "/xsts/authorize";

pub fn sign_in_page(base_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><script type="text/javascript">//<![CDATA[
var ServerData = {{urlPost:'{base_url}{POST_PATH}',sFTTag:'<input type="hidden" name="PPFT" id="i0327" value="ppft-token$$"/>',iMaxStackForKnockoutAsyncComponents:10000,fShowButtons:!0,bIsFidoSupported:!1,sCtx:'',urlMsaSignUp:'https://signup.live.com/signup?lic=1'}};
//]]></script></head><body></body></html>"#
    )
}

pub fn redirect_location(access: &str, refresh: &str) -> String {
    format!(
        "https://login.live.com/oauth20_desktop.srf?lc=1033#access_token={access}&token_type=bearer&expires_in=86400&scope=service::user.auth.xboxlive.com::MBI_SSL&refresh_token={refresh}&user_id=abc"
    )
}

/// Platform timestamps carry seven fractional digits, which chrono cannot format.
pub fn platform_timestamp(ts: DateTime<Utc>) -> String {
    format!(
        "{}.{:07}Z",
        ts.format("%Y-%m-%dT%H:%M:%S"),
        ts.timestamp_subsec_nanos() / 100
    )
}

fn platform_timestamps() -> (String, String) {
    let now = Utc::now();
    (
        platform_timestamp(now),
        platform_timestamp(now + TimeDelta::hours(16)),
    )
}

pub fn issued(token: &str, claims: Value) -> Value {
    let (issued, not_after) = platform_timestamps();
    json!({
        "IssueInstant": issued,
        "NotAfter": not_after,
        "Token": token,
        "DisplayClaims": claims,
    })
}

pub fn identity_claims() -> Value {
    json!({"xui": [{
        "gtg": "tag",
        "xid": XUID,
        "uhs": USERHASH,
        "agg": "Adult",
        "usr": "195 189",
        "utr": "190",
        "prv": "185 186 187"
    }]})
}

/// Identity provider plus platform. Accepts [`PASSWORD`] and [`GOOD_REFRESH`].
pub fn provider(request: &Recorded, base_url: &str) -> Reply {
    match (request.method.as_str(), request.path()) {
        ("GET", AUTHORIZE_PATH) => Reply::html(sign_in_page(base_url)),
        ("POST", POST_PATH) => {
            if request.body.contains(&format!("passwd={PASSWORD}")) {
                Reply::redirect(&redirect_location("signed-in-access", "signed-in-refresh"))
            } else {
                Reply::html("<html>Your account or password is incorrect.</html>")
            }
        }
        ("GET", TOKEN_PATH) => {
            if request.url.contains(&format!("refresh_token={GOOD_REFRESH}")) {
                Reply::json(&json!({
                    "token_type": "bearer",
                    "expires_in": 86400,
                    "scope": "service::user.auth.xboxlive.com::MBI_SSL",
                    "access_token": "refreshed-access",
                    "refresh_token": "refreshed-refresh",
                    "user_id": "abc"
                }))
            } else {
                Reply::json(&json!({
                    "error": "invalid_grant",
                    "error_description": "The provided value for the 'refresh_token' is not valid."
                }))
            }
        }
        ("POST", USER_PATH) => Reply::json(&issued(
            "user-token",
            json!({"xui": [{"uhs": USERHASH}]}),
        )),
        ("POST", DEVICE_PATH) => Reply::json(&issued("device-token", json!({}))),
        ("POST", TITLE_PATH) => Reply::json(&issued("title-token", json!({}))),
        ("POST", XSTS_PATH) => Reply::json(&issued("T", identity_claims())),
        _ => Reply::status(404, "not found"),
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub fn live_config(server: &FakeServer) -> LiveConfig {
    LiveConfig {
        authorize_url: server.url(AUTHORIZE_PATH),
        token_url: server.url(TOKEN_PATH),
        ..LiveConfig::default()
    }
}

pub fn xbox_config(server: &FakeServer) -> XboxConfig {
    XboxConfig {
        user_auth_url: server.url(USER_PATH),
        device_auth_url: server.url(DEVICE_PATH),
        title_auth_url: server.url(TITLE_PATH),
        xsts_url: server.url(XSTS_PATH),
        ..XboxConfig::default()
    }
}

pub fn config(server: &FakeServer, token_file: PathBuf, force_refresh: bool) -> XblConfig {
    XblConfig {
        live: live_config(server),
        xbox: xbox_config(server),
        general: GeneralConfig {
            token_file: Some(token_file),
            request_timeout_secs: 5,
            force_refresh,
            ..GeneralConfig::default()
        },
    }
}
