// Presentation layer - HTTP read API
pub mod app_state;
pub mod error;
pub mod handlers;
pub mod router;
