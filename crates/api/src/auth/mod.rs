//! Token validation for HTTP and WebSocket callers.
//!
//! Session issuance (login, refresh) is owned by the account service; this
//! crate only verifies the HS256 access tokens it mints.

pub mod jwt;
