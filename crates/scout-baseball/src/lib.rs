// Breakout candidate scoring and projection over season-level batting data.

pub mod loader;
pub mod output;
pub mod pipeline;
pub mod season;
pub mod stats;
pub mod viewer;
