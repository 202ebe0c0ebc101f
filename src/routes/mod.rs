//! Routers split by access tier.
//!
//! Every tier is mounted under `/api/v1` by `create_router`; the customer and admin
//! tiers are wrapped in the authentication layer there.

/// Anonymous storefront reads and the auth gateway.
pub mod public;

/// Signed-in shoppers. Requires a valid Bearer token.
pub mod customer;

/// Dashboard staff, mounted at `/api/v1/admin`. Handlers additionally check the
/// `admin` role.
pub mod admin;
