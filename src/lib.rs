//! heatmap-tui library: application core, backend client and rendering.

pub mod app_core;
pub mod config;
pub mod data;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod model;
pub mod theme;
pub mod ui;

pub use app_core::state::{AppAction, AppState, FocusPane};
