//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the renderer and
//! the active scene.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
