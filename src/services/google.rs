// src/services/google.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::common::GoogleOAuthConfig;

pub const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
];

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Token endpoint response for the authorization-code grant
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Profile returned by the v2 userinfo endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoogleUserInfo {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub verified_email: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub locale: String,
}

/// The third-party half of the login flow.
///
/// Implementations perform exactly one outbound call per method and never
/// retry; a dropped future cancels the in-flight request.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// URL the browser is sent to, carrying `state` for CSRF protection
    fn authorization_url(&self, state: &str) -> String;

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, GoogleError>;

    async fn fetch_profile(&self, token: &TokenResponse) -> Result<GoogleUserInfo, GoogleError>;
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    config: GoogleOAuthConfig,
    client: Client,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleOAuthConfig) -> Result<Self, GoogleError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GoogleError::RequestFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuthClient {
    fn authorization_url(&self, state: &str) -> String {
        let scope_param = SCOPES.join(" ");

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline",
            AUTHORIZATION_ENDPOINT,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode(&scope_param),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, GoogleError> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging authorization code for tokens");

        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Token exchange failed");
            return Err(GoogleError::OAuthFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))
    }

    async fn fetch_profile(&self, token: &TokenResponse) -> Result<GoogleUserInfo, GoogleError> {
        let response = self
            .client
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GoogleError::RequestFailed(format!(
                "userinfo returned HTTP {}",
                status
            )));
        }

        response
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleOAuthClient {
        GoogleOAuthClient::new(GoogleOAuthConfig {
            client_id: "test_client_id".to_string(),
            client_secret: "test_secret".to_string(),
            redirect_url: "http://localhost:2626/auth/google/callback".to_string(),
        })
        .expect("client should build")
    }

    #[test]
    fn test_authorization_url_carries_client_and_state() {
        let auth_url = client().authorization_url("abc123");

        assert!(auth_url.starts_with("https://accounts.google.com/o/oauth2/auth?"));
        assert!(auth_url.contains("client_id=test_client_id"));
        assert!(auth_url
            .contains("redirect_uri=http%3A%2F%2Flocalhost%3A2626%2Fauth%2Fgoogle%2Fcallback"));
        assert!(auth_url.contains("response_type=code"));
        assert!(auth_url.contains("state=abc123"));
        assert!(auth_url.contains("access_type=offline"));
        assert!(auth_url.contains("userinfo.profile"));
        assert!(auth_url.contains("userinfo.email"));
        assert!(!auth_url.contains("test_secret"));
    }

    #[test]
    fn test_new_returns_configured_client() {
        let result = GoogleOAuthClient::new(GoogleOAuthConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            redirect_url: "https://app.example.com/auth/google/callback".to_string(),
        });

        let client = result.expect("builder with a timeout should succeed");
        assert!(client.authorization_url("s").contains("client_id=id"));
    }

    #[test]
    fn test_authorization_url_is_deterministic() {
        let c = client();
        assert_eq!(c.authorization_url("s"), c.authorization_url("s"));
        assert_ne!(c.authorization_url("s1"), c.authorization_url("s2"));
    }

    #[test]
    fn test_user_info_tolerates_missing_optional_fields() {
        let info: GoogleUserInfo =
            serde_json::from_str(r#"{"id":"1234","email":"a@b.c"}"#).unwrap();
        assert_eq!(info.id, "1234");
        assert_eq!(info.email, "a@b.c");
        assert!(!info.verified_email);
        assert_eq!(info.locale, "");
    }

    #[test]
    fn test_user_info_requires_id() {
        let result = serde_json::from_str::<GoogleUserInfo>(r#"{"email":"a@b.c"}"#);
        assert!(result.is_err());
    }
}
