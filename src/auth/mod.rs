//! Credentials, token refresh, session signing, and creator discovery.

pub mod refresh;
pub mod resources;
pub mod session;
pub mod token;

pub use refresh::{OAuthTokenSource, TokenSource};
pub use resources::{discover_creators, CreatorChoice};
pub use session::{
    clear_cookie, read_session, set_cookie, sign_session, SessionPayload, COOKIE_NAME,
};
pub use token::Credential;
