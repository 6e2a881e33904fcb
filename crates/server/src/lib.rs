//! FISO optimizer server
//!
//! Serves recommendations, trends and history over HTTP while a background
//! loop keeps probing the configured providers.

pub mod api;
pub mod config;
