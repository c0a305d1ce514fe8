//! HTTP middleware for Kinetic Core.
pub mod auth;
pub mod csrf;

pub use auth::{AuthConfig, AuthContext, AuthError, AuthLayer, AuthMethod, Authenticator, Claims};
pub use csrf::{CsrfConfig, CsrfLayer};
