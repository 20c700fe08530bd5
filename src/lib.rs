// Library exports for testing
pub mod app;
pub mod config;
pub mod display;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod net_info;
pub mod session;
