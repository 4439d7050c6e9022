// auth/mod.rs - Credential and session primitives
//
// password: Argon2id hashing of user passwords
// token:    HS256 session tokens carrying user and organization identity

pub mod password;
pub mod token;

pub use password::{PasswordError, PasswordHasher};
pub use token::{AuthError, Claims, IssuedToken, JwtError, TokenService};
