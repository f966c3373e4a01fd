//! Caller identity.
//!
//! Requests carry `Authorization: Bearer <jwt>` signed with HS256 using
//! `JWT_SECRET`. The `sub` claim is the caller's user ID.

pub mod jwt;
pub mod models;

pub use jwt::JwtVerifier;
pub use models::{AuthUser, JwtClaims};
