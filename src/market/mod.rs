//! Market Module
//! Mission: Stall inventory and booking endpoints

pub mod api;
pub mod models;
pub mod store;

pub use store::MarketStore;
