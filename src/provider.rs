//! Authority descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata ([`ProviderDescriptor`]) covering HTTPS-only
//! device-authorization and token endpoints, supported grant flags, and provider quirks.
//! `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic hook used by flows to decorate
//! outgoing requests and map error responses into [`crate::error::AuthenticationError`].

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
