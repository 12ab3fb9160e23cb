// Centralized logging for the sign-in flow
use crate::oauth::config::TokenResponse;
use log::{debug, info, warn};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log the resolved provider configuration
    pub fn log_provider_configured(authorization_endpoint: &url::Url, redirect_uri: &str) {
        info!(
            "✅ OAuth2 provider configured ({}), callback {}",
            authorization_endpoint.host_str().unwrap_or("unknown host"),
            redirect_uri
        );
    }

    /// Log OAuth URL building
    pub fn log_oauth_url_built(scopes: &str) {
        debug!("🔍 Built OAuth URL with scopes: {scopes}");
    }

    /// Log token exchange start
    pub fn log_token_exchange_start() {
        debug!("🔄 Exchanging authorization code for tokens");
    }

    /// Log what the token endpoint returned, never the token values
    pub fn log_token_exchange_success(tokens: &TokenResponse) {
        debug!(
            "Token exchange succeeded: token_type={:?}, expires_in={:?}, scope={:?}, id_token_present={}",
            tokens.token_type,
            tokens.expires_in,
            tokens.scope,
            tokens.id_token.is_some()
        );
    }

    /// Log a completed sign-in
    pub fn log_session_created(user_id: &str) {
        info!("🔐 Session created for subject {user_id}");
    }

    /// Log a rejected callback and the reason
    pub fn log_callback_rejected(reason: &str) {
        warn!("❌ OAuth callback rejected: {reason}");
    }

    pub fn log_sign_out(had_session: bool) {
        debug!("Sign-out requested (session present: {had_session})");
    }
}
