//! HTTP API handlers for arr-llm-picker.

pub mod admin;
pub mod health;
pub mod simulate;
pub mod webhook;

pub use admin::admin_routes;
pub use health::health_routes;
pub use simulate::simulate_routes;
pub use webhook::webhook_routes;
