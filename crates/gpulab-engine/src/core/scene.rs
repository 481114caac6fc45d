use anyhow::Result;

use crate::device::Renderer;
use crate::input::InputFrame;

/// Control directive returned by scene updates.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

impl AppControl {
    pub fn is_exit(self) -> bool {
        self == AppControl::Exit
    }
}

/// One self-contained rendering demo.
///
/// Lifecycle: `load` once, then `update`/`draw` every frame until `update`
/// returns `Exit`, then `unload` once. Everything allocated in `load` must be
/// released by `unload`; the renderer's resource ledger checks it.
pub trait Scene {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Allocates every GPU resource the scene needs.
    fn load(&mut self, renderer: &mut Renderer<'_>) -> Result<()>;

    /// Advances animation state and consumes this frame's input.
    fn update(&mut self, dt: f32, input: &InputFrame) -> AppControl;

    /// Records and submits the frame.
    fn draw(&mut self, renderer: &mut Renderer<'_>) -> Result<()>;

    /// Releases everything `load` allocated.
    fn unload(&mut self, renderer: &mut Renderer<'_>);
}
