//! Platform adapters translating native window events into `InputEvent`s.

pub mod winit;
