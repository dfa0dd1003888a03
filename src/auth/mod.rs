//! Authentication Module
//! Mission: Credential storage, password hashing, JWT sessions, role gating

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod user_store;

pub use jwt::JwtHandler;
pub use middleware::auth_middleware;
pub use user_store::UserStore;
