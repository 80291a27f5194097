pub mod config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod picker;
pub mod polling;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
