//! Small shared utilities.
//!
//! - [`FrameClock`]: frame delta and elapsed time for the render loop

pub mod time;

pub use time::FrameClock;
