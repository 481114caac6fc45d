//! Time subsystem.
//!
//! One `FrameClock` drives the main loop:
//! - `tick()` once per iteration to obtain the frame delta
//! - `delay()` at the end of the iteration to cap the frame rate

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
