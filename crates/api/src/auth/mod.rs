//! Bearer-token authentication.
//!
//! Tokens are issued by the identity service in front of AdFlow; this
//! crate only verifies them.

pub mod jwt;
