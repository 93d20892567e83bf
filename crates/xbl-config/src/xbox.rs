//! Platform (Xbox Live) authorization endpoints.

use serde::{Deserialize, Serialize};

fn default_user_auth_url() -> String {
    "https://user.auth.xboxlive.com/user/authenticate".into()
}

fn default_device_auth_url() -> String {
    "https://device.auth.xboxlive.com/device/authenticate".into()
}

fn default_title_auth_url() -> String {
    "https://title.auth.xboxlive.com".into()
}

fn default_xsts_url() -> String {
    "https://xsts.auth.xboxlive.com/xsts/authorize".into()
}

fn default_sandbox_id() -> String {
    "RETAIL".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct XboxConfig {
    #[serde(default = "default_user_auth_url")]
    pub user_auth_url: String,

    #[serde(default = "default_device_auth_url")]
    pub device_auth_url: String,

    #[serde(default = "default_title_auth_url")]
    pub title_auth_url: String,

    /// Final authorization (XSTS) endpoint.
    #[serde(default = "default_xsts_url")]
    pub xsts_url: String,

    /// Sandbox sent with the authorization request.
    #[serde(default = "default_sandbox_id")]
    pub sandbox_id: String,
}

impl Default for XboxConfig {
    fn default() -> Self {
        Self {
            user_auth_url: default_user_auth_url(),
            device_auth_url: default_device_auth_url(),
            title_auth_url: default_title_auth_url(),
            xsts_url: default_xsts_url(),
            sandbox_id: default_sandbox_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = XboxConfig::default();
        assert_eq!(config.sandbox_id, "RETAIL");
        assert_eq!(
            config.xsts_url,
            "https://xsts.auth.xboxlive.com/xsts/authorize"
        );
    }
}
