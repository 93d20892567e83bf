//! Identity-provider exchanges against a local fake provider.

mod support;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeDelta;
use serde_json::{Value, json};
use support::{FakeServer, Recorded, Reply};
use xbl_auth::{AuthError, ChallengeResponse, LiveClient, TwoFactorHandler};
use xbl_core::{Token, TokenKind};

fn client(server: &FakeServer) -> LiveClient {
    LiveClient::new(support::live_config(server), Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn sign_in_posts_form_and_reads_redirect_fragment() {
    let server = FakeServer::start(support::provider);

    let tokens = client(&server)
        .sign_in_with_credentials("player@example.com", support::PASSWORD)
        .await
        .expect("sign in");

    assert_eq!(tokens.access.value(), "signed-in-access");
    assert_eq!(tokens.access.kind(), TokenKind::AccessToken);
    assert_eq!(tokens.refresh.value(), "signed-in-refresh");

    let requests = server.requests();
    let page = &requests[0];
    assert_eq!(page.method, "GET");
    assert!(page.url.contains("client_id=0000000048093EE3"));
    assert!(page.url.contains("response_type=token"));
    assert!(page.url.contains("display=touch"));
    assert!(page.url.contains("locale=en"));

    let post = &requests[1];
    assert_eq!(post.method, "POST");
    assert_eq!(post.path(), support::POST_PATH);
    assert_eq!(
        post.header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    for field in [
        "login=player%40example.com",
        "passwd=correct-horse",
        "PPFT=ppft-token%24%24",
        "PPSX=Passpor",
        "SI=Sign%20in",
        "type=11",
        "NewUser=1",
        "LoginOptions=1",
    ] {
        assert!(post.body.contains(field), "missing {field} in {}", post.body);
    }
}

#[tokio::test]
async fn rejected_password_without_redirect_fails_authentication() {
    let server = FakeServer::start(support::provider);

    let err = client(&server)
        .sign_in_with_credentials("player@example.com", "wrong")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::AuthenticationFailed(_)), "{err}");
}

#[tokio::test]
async fn page_without_server_data_is_malformed() {
    let server = FakeServer::start(|_: &Recorded, _: &str| Reply::html("<html>maintenance</html>"));

    let err = client(&server)
        .sign_in_with_credentials("player@example.com", support::PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::MalformedResponse(_)), "{err}");
    assert_eq!(server.hits(support::POST_PATH), 0);
}

#[tokio::test]
async fn server_error_on_sign_in_page_is_transport() {
    let server = FakeServer::start(|_: &Recorded, _: &str| Reply::status(503, "unavailable"));

    let err = client(&server)
        .sign_in_with_credentials("player@example.com", support::PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Transport(_)), "{err}");
}

// ---------------------------------------------------------------------------
// Two-factor
// ---------------------------------------------------------------------------

fn two_factor_provider(request: &Recorded, base_url: &str) -> Reply {
    if request.path() == support::POST_PATH {
        return Reply::html(
            "<script>var ServerData = {sProofData: 'x', arrUserProofs: [{type: 1, display: '*****12'}]};\
             var PROOF = {}; PROOF.Type = {SMS: 1, Email: 8};</script>",
        );
    }
    support::provider(request, base_url)
}

struct ScriptedChallenge {
    location: Option<String>,
    seen: std::sync::Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl TwoFactorHandler for ScriptedChallenge {
    async fn challenge(
        &self,
        username: &str,
        server_data: &Value,
    ) -> Result<Option<ChallengeResponse>, AuthError> {
        self.seen
            .lock()
            .expect("seen")
            .push((username.to_string(), server_data.clone()));
        Ok(self.location.clone().map(|location| ChallengeResponse {
            location: Some(location),
        }))
    }
}

#[tokio::test]
async fn two_factor_challenge_is_declined_by_default() {
    let server = FakeServer::start(two_factor_provider);

    let err = client(&server)
        .sign_in_with_credentials("player@example.com", support::PASSWORD)
        .await
        .unwrap_err();

    assert!(
        matches!(err, AuthError::AuthenticationFailed(ref m) if m.contains("two-factor")),
        "{err}"
    );
}

#[tokio::test]
async fn two_factor_handler_receives_challenge_page_data() {
    let server = FakeServer::start(two_factor_provider);
    let handler = Arc::new(ScriptedChallenge {
        location: Some(support::redirect_location("2fa-access", "2fa-refresh")),
        seen: std::sync::Mutex::default(),
    });

    let tokens = client(&server)
        .with_two_factor(handler.clone())
        .sign_in_with_credentials("player@example.com", support::PASSWORD)
        .await
        .expect("sign in after challenge");

    assert_eq!(tokens.access.value(), "2fa-access");
    let seen = handler.seen.lock().expect("seen");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "player@example.com");
    assert_eq!(seen[0].1["arrUserProofs"], json!([{"type": 1, "display": "*****12"}]));
}

#[tokio::test]
async fn handler_returning_no_location_fails_authentication() {
    let server = FakeServer::start(two_factor_provider);
    let handler = Arc::new(ScriptedChallenge {
        location: None,
        seen: std::sync::Mutex::default(),
    });

    let err = client(&server)
        .with_two_factor(handler)
        .sign_in_with_credentials("player@example.com", support::PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::AuthenticationFailed(_)), "{err}");
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_exchanges_valid_refresh_token() {
    let server = FakeServer::start(support::provider);

    let tokens = client(&server)
        .refresh(&Token::refresh(support::GOOD_REFRESH))
        .await
        .expect("refresh");

    assert_eq!(tokens.access.value(), "refreshed-access");
    assert_eq!(tokens.refresh.value(), "refreshed-refresh");
    assert_eq!(
        tokens.access.expires_at() - tokens.access.issued_at(),
        TimeDelta::seconds(86400)
    );

    let request = &server.requests()[0];
    assert_eq!(request.method, "GET");
    assert!(request.url.contains("grant_type=refresh_token"));
    assert!(request.url.contains("client_id=0000000048093EE3"));
    assert!(request.url.contains("refresh_token=good-refresh"));
}

#[tokio::test]
async fn refresh_rejected_by_provider_fails_authentication() {
    let server = FakeServer::start(support::provider);

    let err = client(&server)
        .refresh(&Token::refresh("revoked"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::AuthenticationFailed(_)), "{err}");
}

#[tokio::test]
async fn refresh_with_non_json_body_is_malformed() {
    let server = FakeServer::start(|_: &Recorded, _: &str| Reply::html("<html>oops</html>"));

    let err = client(&server)
        .refresh(&Token::refresh(support::GOOD_REFRESH))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::MalformedResponse(_)), "{err}");
}

#[tokio::test]
async fn expired_refresh_token_never_reaches_the_network() {
    let server = FakeServer::start(support::provider);
    let expired = Token::issued_now(TokenKind::RefreshToken, support::GOOD_REFRESH, -TimeDelta::seconds(1));

    let err = client(&server).refresh(&expired).await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidToken(_)), "{err}");
    assert!(server.requests().is_empty());
}
