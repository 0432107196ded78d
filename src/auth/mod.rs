//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user id in the [`USER_HEADER`] header and these extractors resolve it to a
//! user and role.

mod middleware;

pub use middleware::{AuthError, Caller, CapabilityMarker, RequireCapability, USER_HEADER, cap};
