//! Registration gating.

/// Whether new registrations are accepted.
///
/// Passed explicitly into the registration operation. Reloaded from the
/// config file on SIGHUP, so callers read it per request rather than caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignupPolicy {
    pub open: bool,
}

impl SignupPolicy {
    pub const OPEN: Self = Self { open: true };
    pub const CLOSED: Self = Self { open: false };
}
