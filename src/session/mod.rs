pub mod codec;
pub mod cookie;
pub mod manager;

pub use codec::SessionCodec;
pub use cookie::{CookieFactory, COOKIE_NAME, OAUTH_STATE_COOKIE};
pub use manager::SessionManager;
