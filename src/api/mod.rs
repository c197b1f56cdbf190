// Game server API module.
// Provides the HTTP client and types for the Schocken REST endpoints.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{ApiOutcome, GameClient};
pub use types::*;
