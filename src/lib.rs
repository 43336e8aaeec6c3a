//! Core modules for the trackswipe gesture recognizer.
//!
//! Turns streams of relative X/Y motion events from trackball-style input
//! devices into directional swipe actions. This library exposes the internal
//! modules for the binary and for integration tests; it is not intended as a
//! stable external API.

pub mod config;
pub mod gesture;
pub mod input;

pub use config::AppConfig;
pub use gesture::{Direction, GestureEvent};
