//! Header names shared between the server and the clients.

/// Header carrying the plaintext admin secret on every Admin API request.
pub const ADMIN_AUTH_HEADER: &str = "Rosterlink-Admin-Authorization";

/// Header the tournament platform expects its bearer token in.
pub const PLATFORM_AUTH_HEADER: &str = "x-mno-auth";
