// schockpanel library.
// Admin panel for Schocken game sessions and a static asset cache with expiry.

pub mod api;
pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod panel;
pub mod paths;
pub mod session;
pub mod storage;
pub mod ui;

#[cfg(test)]
mod test_support;

pub use error::{PanelError, Result};
