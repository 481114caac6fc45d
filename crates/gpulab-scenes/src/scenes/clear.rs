use anyhow::Result;

use gpulab_engine::core::{AppControl, Scene};
use gpulab_engine::device::Renderer;
use gpulab_engine::input::{InputFrame, InputState};

/// Acquires the swapchain texture, clears it to black and presents it.
#[derive(Debug, Default)]
pub struct ClearScene {
    input: InputState,
}

impl ClearScene {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scene for ClearScene {
    fn name(&self) -> &'static str {
        "clear"
    }

    fn load(&mut self, _renderer: &mut Renderer<'_>) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, _dt: f32, input: &InputFrame) -> AppControl {
        self.input.manage(input)
    }

    fn draw(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        renderer.begin(None)?;
        renderer.end()
    }

    fn unload(&mut self, _renderer: &mut Renderer<'_>) {}
}
