//! Authentication module
//! 访问令牌校验与当前用户解析

pub mod jwt;
pub mod middleware;

pub use jwt::{JwtService, TokenClaims, TokenKind};
pub use middleware::{extract_token, jwt_auth_middleware, Actor};
