// src/lib.rs

pub mod comments;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

// Re-export the router builder at the crate root
pub use routes::create_router;
