//! Service account authentication for the Compute Engine API.
//!
//! A signed JWT assertion is exchanged for a short-lived bearer token. The
//! token is reused by concurrent requests until shortly before it expires.

use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::GceError;

pub(super) const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const COMPUTE_SCOPE: &str = "https://www.googleapis.com/auth/compute";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

const fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS
}

struct AccessToken {
    value: String,
    refresh_after: Instant,
}

/// Mints and caches OAuth access tokens for one service account.
pub(super) struct TokenSource {
    client_email: String,
    key: EncodingKey,
    token_url: String,
    cached: Mutex<Option<AccessToken>>,
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSource")
            .field("client_email", &self.client_email)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl TokenSource {
    /// Parses the PEM key up front so a malformed key fails at construction.
    pub(super) fn new(
        client_email: impl Into<String>,
        private_key_pem: &str,
        token_url: impl Into<String>,
    ) -> Result<Self, GceError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|err| GceError::Config(format!("invalid service account key: {err}")))?;
        Ok(Self {
            client_email: client_email.into(),
            key,
            token_url: token_url.into(),
            cached: Mutex::new(None),
        })
    }

    fn assertion(&self) -> Result<String, GceError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| GceError::Auth {
                message: err.to_string(),
            })?
            .as_secs();
        let claims = Claims {
            iss: &self.client_email,
            scope: COMPUTE_SCOPE,
            aud: &self.token_url,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.key).map_err(|err| {
            GceError::Auth {
                message: format!("failed to sign assertion: {err}"),
            }
        })
    }

    /// Returns a valid bearer token, exchanging a fresh assertion when the
    /// cached one is missing or about to expire.
    pub(super) async fn bearer(&self, http: &reqwest::Client) -> Result<String, GceError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_after
        {
            return Ok(token.value.clone());
        }

        let assertion = self.assertion()?;
        let response = http
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|err| GceError::Auth {
                message: err.to_string(),
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|err| GceError::Auth {
            message: err.to_string(),
        })?;
        if !status.is_success() {
            return Err(GceError::Auth {
                message: format!(
                    "token endpoint returned {status}: {}",
                    String::from_utf8_lossy(&body)
                ),
            });
        }

        let parsed: TokenResponse =
            serde_json::from_slice(&body).map_err(|err| GceError::Auth {
                message: format!("malformed token response: {err}"),
            })?;
        debug!(
            client_email = %self.client_email,
            expires_in = parsed.expires_in,
            "obtained access token"
        );

        let lifetime = Duration::from_secs(parsed.expires_in).saturating_sub(EXPIRY_MARGIN);
        let value = parsed.access_token;
        *cached = Some(AccessToken {
            value: value.clone(),
            refresh_after: Instant::now() + lifetime,
        });
        Ok(value)
    }
}
