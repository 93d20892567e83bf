//! # xbl-auth
//!
//! Two-tier Xbox Live authentication.
//!
//! A Windows Live sign-in (scraped HTML form, or a refresh-token exchange)
//! yields an access token; the Xbox Live platform turns that into a user token
//! and then an XSTS session token plus the user's identity claims.
//! [`AuthenticationManager`] drives the whole chain, reusing cached tokens
//! where it can, and persists the result with [`token_file`].

pub mod error;
mod http;
pub mod live;
pub mod manager;
pub mod relaxed_json;
pub mod server_data;
pub mod session;
pub mod token_file;
pub mod two_factor;
pub mod xbox;

pub use error::AuthError;
pub use live::{LiveClient, LiveTokens};
pub use manager::{AuthPhase, AuthenticationManager, Credentials};
pub use session::ApiSession;
pub use two_factor::{ChallengeResponse, DeclineTwoFactor, TwoFactorHandler};
pub use xbox::XboxLiveClient;

/// Forget saved tokens.
///
/// # Errors
///
/// Returns `AuthError::TokenStore` if the token file cannot be removed.
pub fn logout(token_file: &std::path::Path) -> Result<(), AuthError> {
    token_file::delete(token_file)
}
