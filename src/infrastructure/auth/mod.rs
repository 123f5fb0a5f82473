//! Bearer token validation for portal users

mod jwt;

pub use jwt::{JwtClaims, JwtConfig, JwtService, TokenValidator};
