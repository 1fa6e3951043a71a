pub mod analysis;
pub mod backend;
pub mod chart;
pub mod config;
pub mod pipeline;
pub mod playback;
pub mod render;
pub mod report;

/// Application name for XDG paths
pub const APP_NAME: &str = "riffcheck";
