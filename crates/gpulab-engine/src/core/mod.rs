//! Core engine-facing contracts.
//!
//! Defines the interface between the runtime (platform loop) and the demo
//! scenes built on top of it.

mod scene;

pub use scene::{AppControl, Scene};
