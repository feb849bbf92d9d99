//! Password digests and bearer tokens.

mod hasher;
mod jwt;

pub use hasher::BcryptHasher;
pub use jwt::JwtTokenService;
