pub mod aggregate;
pub mod chart;
pub mod config;
pub mod error;
pub mod map_draw;
pub mod observations;
pub mod parks;
pub mod quakes;
pub mod scale;
pub mod state;
pub mod ui;
pub mod view;

pub use error::{AtlasError, Result};
