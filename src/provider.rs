//! Identity-provider descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata ([`IdentityProvider`]): issuer-derived endpoints,
//! enabled grants, the client authentication mode, and quirks such as PKCE enforcement.
//! `strategy` defines [`ProviderStrategy`], the hook flows use to decorate token requests
//! and classify failures into the gateway error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
