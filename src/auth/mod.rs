//! Sign-in and session authentication.
//!
//! A Google ID token is exchanged once for a portal token pair; every other
//! request authenticates with the access token as a bearer credential.

mod error;
mod google;
mod tokens;

pub use error::AuthError;
pub use google::{GoogleIdTokenVerifier, SharedGoogleVerifier};
pub use tokens::{TokenIssuer, TokenKind, TokenPair};
