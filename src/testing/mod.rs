//! Testing utilities for Gatekeep
//!
//! Enabled with the `testing` feature so integration tests under `tests/`
//! can share fixtures and a mock identity provider.
//!
//! - [`fixtures`] - Pre-built settings, session managers and profiles
//! - [`mock`] - In-memory `OAuthAuthenticationService`
//! - [`requests`] - Request builders for the callback flow
//! - [`assertions`] - Assertions on redirects and cookies
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gatekeep::testing::{mock::MockOAuthService, TestFixtures};
//!
//! let mock = MockOAuthService::accepting("good-code", TestFixtures::profile());
//! let services = TestFixtures::services(mock);
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock;
pub mod requests;

// Re-export commonly used items for convenience
pub use assertions::*;
pub use fixtures::TestFixtures;
pub use mock::MockOAuthService;
pub use requests::RequestBuilder;

/// Common test constants
pub mod constants {
    /// Subject identifier returned by the mock provider
    pub const TEST_SUBJECT: &str = "108234567890123456789";

    /// Default test email address
    pub const TEST_EMAIL: &str = "test@example.com";

    /// Authorization code the mock provider accepts
    pub const TEST_VALID_CODE: &str = "4/0AbCdEf-valid";

    /// Primary cookie signing key used by fixtures
    pub const TEST_COOKIE_KEY: &str = "test_cookie_key_primary_0123456789";

    /// Secondary cookie signing key used by rotation tests
    pub const TEST_COOKIE_KEY_OLD: &str = "test_cookie_key_previous_987654321";

    pub const TEST_CLIENT_ID: &str = "test-client-id.apps.googleusercontent.com";
    pub const TEST_CLIENT_SECRET: &str = "test-client-secret";
}
