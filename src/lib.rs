//! Market Stall Booking Backend Library
//!
//! Exposes the application modules for the server binary, the seed tool,
//! and integration tests.

pub mod app;
pub mod auth;
pub mod config;
pub mod market;
pub mod middleware;
