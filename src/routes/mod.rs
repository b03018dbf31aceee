//! Router Module Index
//!
//! Splits the routes by access level. The session requirement is applied as a
//! layer on the whole authenticated router, so a handler cannot be exposed
//! without it by accident.

/// Routes open to anonymous clients.
pub mod public;

/// Routes behind `auth::require_session`.
pub mod authenticated;
