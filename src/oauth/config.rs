//! Provider endpoints and the outbound HTTP calls of the code flow

use crate::models::UserProfile;
use crate::oauth::service::OAuthError;
use crate::settings::{Credentials, GatekeepSettings};
use crate::utils::logging::LoggingHelper;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Successful response from the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Resolved provider configuration plus the HTTP client used to reach it
#[derive(Clone)]
pub struct OAuthConfig {
    authorization_endpoint: Url,
    token_endpoint: Url,
    userinfo_endpoint: Url,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("authorization_endpoint", &self.authorization_endpoint.as_str())
            .field("token_endpoint", &self.token_endpoint.as_str())
            .field("userinfo_endpoint", &self.userinfo_endpoint.as_str())
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

impl OAuthConfig {
    /// Build the provider configuration from settings and credentials
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An endpoint is not a valid absolute URL
    /// - The HTTP client cannot be constructed
    pub fn from_settings(
        settings: &GatekeepSettings,
        credentials: &Credentials,
    ) -> Result<Self, OAuthError> {
        let provider = &settings.provider;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(provider.request_timeout_secs))
            .build()
            .map_err(|e| OAuthError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let config = Self {
            authorization_endpoint: parse_endpoint(
                "authorization_endpoint",
                &provider.authorization_endpoint,
            )?,
            token_endpoint: parse_endpoint("token_endpoint", &provider.token_endpoint)?,
            userinfo_endpoint: parse_endpoint("userinfo_endpoint", &provider.userinfo_endpoint)?,
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            redirect_uri: settings.callback_url(),
            scopes: provider.scopes.clone(),
            http_client,
        };

        LoggingHelper::log_provider_configured(&config.authorization_endpoint, &config.redirect_uri);
        Ok(config)
    }

    /// Build the provider authorization URL for one sign-in attempt
    #[must_use]
    pub fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        let scopes = self.scopes.join(" ");
        let mut url = self.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &scopes)
            .append_pair("state", state)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256");

        LoggingHelper::log_oauth_url_built(&scopes);
        url.into()
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Exchange` if:
    /// - The request fails or times out
    /// - The provider answers with a non-success status or an `error` member
    /// - The response is not a valid token response
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code_verifier", code_verifier),
        ];

        LoggingHelper::log_token_exchange_start();
        let response = self
            .http_client
            .post(self.token_endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::Exchange(format!("Failed to reach token endpoint: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OAuthError::Exchange(format!(
                "Token endpoint returned {status}: {error_text}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OAuthError::Exchange(format!("Failed to read token response: {e}")))?;
        if let Some(error) = provider_error(&body) {
            return Err(OAuthError::Exchange(format!("Token endpoint error: {error}")));
        }

        let tokens: TokenResponse = serde_json::from_value(body)
            .map_err(|e| OAuthError::Exchange(format!("Failed to parse token response: {e}")))?;
        LoggingHelper::log_token_exchange_success(&tokens);
        Ok(tokens)
    }

    /// Retrieve the signed-in user's profile with an access token
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::ProfileFetch` if:
    /// - The request fails or times out
    /// - The provider answers with a non-success status or an `error` member
    /// - The profile has no `sub` identifier
    pub async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, OAuthError> {
        let response = self
            .http_client
            .get(self.userinfo_endpoint.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                OAuthError::ProfileFetch(format!("Failed to reach userinfo endpoint: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OAuthError::ProfileFetch(format!(
                "Userinfo endpoint returned {status}"
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            OAuthError::ProfileFetch(format!("Failed to read userinfo response: {e}"))
        })?;
        if let Some(error) = provider_error(&body) {
            return Err(OAuthError::ProfileFetch(format!(
                "Userinfo endpoint error: {error}"
            )));
        }

        let profile: UserProfile = serde_json::from_value(body)
            .map_err(|e| OAuthError::ProfileFetch(format!("Failed to parse profile: {e}")))?;
        if profile.sub.is_empty() {
            return Err(OAuthError::ProfileFetch(
                "Profile has an empty subject identifier".to_string(),
            ));
        }

        log::debug!("Fetched profile for subject {}", profile.sub);
        Ok(profile)
    }
}

fn parse_endpoint(name: &str, value: &str) -> Result<Url, OAuthError> {
    Url::parse(value).map_err(|e| OAuthError::Configuration(format!("Invalid {name} '{value}': {e}")))
}

/// Extract an OAuth-style `error` member, with its description if present
fn provider_error(body: &serde_json::Value) -> Option<String> {
    let error = body.get("error")?;
    let code = error
        .as_str()
        .map_or_else(|| error.to_string(), ToString::to_string);
    match body.get("error_description").and_then(|d| d.as_str()) {
        Some(description) => Some(format!("{code} ({description})")),
        None => Some(code),
    }
}
