//! Caller authentication
//!
//! Verifies bearer tokens and hands the transfer endpoints a trusted
//! `CallerIdentity`. Signup, login and token issuance live elsewhere.

pub mod middleware;
pub mod service;

pub use middleware::jwt_auth_middleware;
pub use service::{AuthError, CallerIdentity, Claims, TokenVerifier};
