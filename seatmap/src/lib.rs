//! SeatMap - find free seats nearby
//!
//! Headless client core: place/rating cache, favorites, manager and admin
//! sessions, live location with an animated user marker, and routes with
//! ETA labels. The `seatmap` binary drives it from the command line.

pub mod core;
pub mod logging;

// Re-export workspace crates for the binary and for front ends
pub use seatmap_client;
pub use shared;

pub use core::{AppConfig, AppError, AppResult, Controller};
