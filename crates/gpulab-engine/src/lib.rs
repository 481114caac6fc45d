//! gpulab engine crate.
//!
//! This crate owns the platform + GPU runtime pieces the demo scenes are built on.

pub mod content;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod resource;
pub mod time;
pub mod window;
