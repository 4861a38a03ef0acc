//! Application core: geometry, state, input types, reducer and view-models.

pub mod chart;
pub mod fetch;
pub mod geometry;
pub mod heatmap;
pub mod input;
pub mod reducer;
pub mod state;
pub mod view;
