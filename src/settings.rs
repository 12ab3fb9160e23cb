use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Google's OAuth2 endpoints, used unless overridden in Settings.toml
pub const GOOGLE_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_DURATION_HOURS: u64 = 24 * 366;

/// Path the provider redirects back to after the user signs in
pub const CALLBACK_PATH: &str = "/auth/google/callback";

/// Errors raised while assembling the startup configuration
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings file {path}: {message}")]
    Parse { path: String, message: String },
    #[error("Missing required credential: {0}")]
    MissingCredential(&'static str),
    #[error("Invalid value for {name}: {message}")]
    InvalidValue {
        name: &'static str,
        message: String,
    },
    #[error("Failed to initialise logger: {0}")]
    Logger(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatekeepSettings {
    pub application: ApplicationSettings,
    pub tls: TlsSettings,
    pub static_files: StaticFilesSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub logging: LoggingSettings,
    pub provider: ProviderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub redirect_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    pub enabled: bool,
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticFilesSettings {
    pub assets_folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Lifetime of a session, applied both to the cookie Max-Age and to the
    /// signed expiry inside the token
    pub session_duration_hours: u64,
    /// Cookie signing keys. The first key signs, every key verifies.
    pub cookie_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub scopes: Vec<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Upper bound for each outbound call to the provider
    pub request_timeout_secs: u64,
}

/// Application credentials resolved at startup and immutable afterwards
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    signing_keys: Vec<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("signing_keys", &self.signing_keys.len())
            .finish()
    }
}

impl Credentials {
    /// Build credentials, rejecting an empty key list
    ///
    /// # Errors
    ///
    /// Returns an error if `signing_keys` is empty
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        signing_keys: Vec<String>,
    ) -> Result<Self, SettingsError> {
        if signing_keys.is_empty() {
            return Err(SettingsError::MissingCredential("COOKIE_KEY_1"));
        }
        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            signing_keys,
        })
    }

    /// Keys in priority order; the first one signs new sessions
    #[must_use]
    pub fn signing_keys(&self) -> &[String] {
        &self.signing_keys
    }
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            redirect_base_url: "https://localhost:3000".to_string(),
        }
    }
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cert_path: "cert.pem".to_string(),
            key_path: "key.pem".to_string(),
        }
    }
}

impl Default for StaticFilesSettings {
    fn default() -> Self {
        Self {
            assets_folder: "public".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_duration_hours: 24,
            cookie_keys: Vec::new(), // Generated if still empty after env overrides
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true, // TLS is terminated in-process by default
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            authorization_endpoint: GOOGLE_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
            userinfo_endpoint: GOOGLE_USERINFO_ENDPOINT.to_string(),
            scopes: vec!["email".to_string()],
            client_id: None,
            client_secret: None,
            request_timeout_secs: 10,
        }
    }
}

impl GatekeepSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - A settings file cannot be read or parsed
    /// - A setting is out of range
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_env_file(Path::new(".env"));

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        settings.validate()?;
        Self::initialize_logger(&settings.logging)?;

        Ok(settings)
    }

    /// Initialise `env_logger`; `RUST_LOG` wins over the configured level
    fn initialize_logger(logging: &LoggingSettings) -> Result<(), SettingsError> {
        let env = env_logger::Env::default().default_filter_or(logging.level.as_str());
        env_logger::Builder::from_env(env)
            .try_init()
            .map_err(|e| SettingsError::Logger(e.to_string()))
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (applied separately)
    /// 2. Settings.toml in `GATEKEEP_SECRETS_DIR`
    /// 3. Settings.toml in the current directory
    /// 4. Defaults
    fn load_base_settings() -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        let default_config_path = Path::new("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_toml_file(default_config_path)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("GATEKEEP_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_toml_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ GATEKEEP_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a single TOML settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_toml_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        basic_toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_tls_env_overrides(&mut settings.tls);
        Self::apply_static_files_env_overrides(&mut settings.static_files);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_logging_env_overrides(&mut settings.logging);
        Self::apply_provider_env_overrides(&mut settings.provider);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Some(port) = Self::parse_env::<u16>("PORT") {
            app_settings.port = port;
        }
        if let Ok(redirect_base_url) = std::env::var("REDIRECT_BASE_URL") {
            app_settings.redirect_base_url = redirect_base_url;
        }
    }

    fn apply_tls_env_overrides(tls_settings: &mut TlsSettings) {
        if let Some(enabled) = Self::parse_env::<bool>("TLS_ENABLED") {
            tls_settings.enabled = enabled;
        }
        if let Ok(cert_path) = std::env::var("TLS_CERT_PATH") {
            tls_settings.cert_path = cert_path;
        }
        if let Ok(key_path) = std::env::var("TLS_KEY_PATH") {
            tls_settings.key_path = key_path;
        }
    }

    fn apply_static_files_env_overrides(static_settings: &mut StaticFilesSettings) {
        if let Ok(assets_folder) = std::env::var("STATIC_FOLDER_PATH") {
            static_settings.assets_folder = assets_folder;
        }
    }

    /// Apply environment overrides for session settings
    ///
    /// `COOKIE_KEY_1` and `COOKIE_KEY_2` replace any keys from the settings
    /// file. When no key is configured anywhere a random one is generated.
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Some(hours) = Self::parse_env::<u64>("SESSION_DURATION_HOURS") {
            session_settings.session_duration_hours = hours;
        }

        let env_keys: Vec<String> = ["COOKIE_KEY_1", "COOKIE_KEY_2"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .filter(|key| !key.is_empty())
            .collect();
        if !env_keys.is_empty() {
            session_settings.cookie_keys = env_keys;
        }

        session_settings.cookie_keys.retain(|key| !key.is_empty());
        if session_settings.cookie_keys.is_empty() {
            let generated = Self::generate_random_cookie_key();
            Self::warn_about_generated_key(&generated);
            session_settings.cookie_keys.push(generated);
        }
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Some(secure) = Self::parse_env::<bool>("COOKIE_SECURE") {
            cookie_settings.secure = secure;
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    fn apply_provider_env_overrides(provider_settings: &mut ProviderSettings) {
        if let Ok(client_id) = std::env::var("CLIENT_ID") {
            provider_settings.client_id = Some(client_id);
        }
        if let Ok(client_secret) = std::env::var("CLIENT_SECRET") {
            provider_settings.client_secret = Some(client_secret);
        }
        if let Some(timeout) = Self::parse_env::<u64>("PROVIDER_TIMEOUT_SECS") {
            provider_settings.request_timeout_secs = timeout;
        }
    }

    fn parse_env<T: std::str::FromStr>(env_var: &str) -> Option<T> {
        std::env::var(env_var).ok()?.parse::<T>().ok()
    }

    /// Generate a cryptographically secure random cookie key (256 bits)
    fn generate_random_cookie_key() -> String {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        general_purpose::STANDARD.encode(secret)
    }

    fn warn_about_generated_key(key: &str) {
        eprintln!("⚠️  WARNING: Using auto-generated cookie signing key");
        eprintln!("📝 Generated key: {key}");
        eprintln!("🔒 For production use, set COOKIE_KEY_1 (and COOKIE_KEY_2 while rotating)");
        eprintln!("💡 Sessions will not survive a restart unless a key is configured");
    }

    /// Load environment variables from a dotenv-style file
    fn load_env_file(path: &Path) {
        if let Ok(contents) = fs::read_to_string(path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let value = value.trim().trim_matches('"');
                    std::env::set_var(key.trim(), value);
                }
            }
        }
    }

    /// Reject settings that would only fail once requests arrive
    ///
    /// # Errors
    ///
    /// Returns an error if the session lifetime is outside
    /// `1..=MAX_SESSION_DURATION_HOURS`
    pub fn validate(&self) -> Result<(), SettingsError> {
        let hours = self.session.session_duration_hours;
        if !(1..=MAX_SESSION_DURATION_HOURS).contains(&hours) {
            return Err(SettingsError::InvalidValue {
                name: "SESSION_DURATION_HOURS",
                message: format!("{hours} is not between 1 and {MAX_SESSION_DURATION_HOURS}"),
            });
        }
        Ok(())
    }

    /// Resolve the application credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the client id, client secret or signing keys are missing
    pub fn credentials(&self) -> Result<Credentials, SettingsError> {
        let client_id = self
            .provider
            .client_id
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or(SettingsError::MissingCredential("CLIENT_ID"))?;
        let client_secret = self
            .provider
            .client_secret
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or(SettingsError::MissingCredential("CLIENT_SECRET"))?;
        Credentials::new(client_id, client_secret, self.session.cookie_keys.clone())
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Absolute callback URL registered with the provider
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!(
            "{}{CALLBACK_PATH}",
            self.application.redirect_base_url.trim_end_matches('/')
        )
    }
}
