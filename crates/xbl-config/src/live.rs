//! Identity-provider (Windows Live) endpoints and client registration.

use serde::{Deserialize, Serialize};

fn default_client_id() -> String {
    "0000000048093EE3".into()
}

fn default_authorize_url() -> String {
    "https://login.live.com/oauth20_authorize.srf".into()
}

fn default_token_url() -> String {
    "https://login.live.com/oauth20_token.srf".into()
}

fn default_redirect_uri() -> String {
    "https://login.live.com/oauth20_desktop.srf".into()
}

fn default_scope() -> String {
    "service::user.auth.xboxlive.com::MBI_SSL".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LiveConfig {
    /// OAuth client id registered for the Xbox companion app.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Sign-in page (GET, returns HTML with the `ServerData` script object).
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    /// Refresh-token exchange endpoint (GET, returns JSON).
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Redirect URI whose fragment carries the issued tokens.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    #[serde(default = "default_scope")]
    pub scope: String,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            client_id: default_client_id(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
        }
    }
}
