//! Credentials for the API transport.
//!
//! Either a static access key (`Authorization: Client-ID <key>`) or an
//! OAuth bearer token obtained through a loopback browser redirect and
//! persisted to a token file.

mod oauth;
mod token;

pub use oauth::OAuthFlow;
pub use token::{Token, TokenStore};

use crate::error::Result;
use crate::models::AuthConfig;

/// Value sent in the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Public access key of a registered application
    ClientId(String),
    /// OAuth access token
    Bearer(String),
}

impl Credentials {
    pub fn header_value(&self) -> String {
        match self {
            Credentials::ClientId(key) => format!("Client-ID {key}"),
            Credentials::Bearer(token) => format!("Bearer {token}"),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ClientId(_) => f.write_str("ClientId(..)"),
            Credentials::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}

/// Pick credentials for a run.
///
/// A configured access key wins; otherwise a stored, unexpired token is
/// reused, and only then is the browser flow started.
pub async fn resolve_credentials(config: &AuthConfig) -> Result<Credentials> {
    if let Some(key) = config.access_key.as_deref().filter(|k| !k.trim().is_empty()) {
        log::debug!("Using static access key");
        return Ok(Credentials::ClientId(key.trim().to_string()));
    }

    let store = TokenStore::new(&config.token_file);
    match store.load() {
        Ok(Some(token)) if !token.is_expired() => {
            log::info!("Using stored token from {}", store.path().display());
            return Ok(Credentials::Bearer(token.access_token));
        }
        Ok(Some(_)) => log::info!("Stored token has expired, authorizing again"),
        Ok(None) => log::info!("No stored token, starting authorization"),
        Err(e) => log::warn!("Ignoring unreadable token file: {e}"),
    }

    let token = OAuthFlow::new(config.clone())?.authorize().await?;
    store.save(&token)?;
    log::info!("Token saved to {}", store.path().display());
    Ok(Credentials::Bearer(token.access_token))
}
