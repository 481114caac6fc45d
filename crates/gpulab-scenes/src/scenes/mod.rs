//! The demo scenes, one technique each.

mod basic_compute;
mod clear;
mod cull_modes;
mod sprite_batch_compute;
mod texture_quad;
mod texture_quad_moving;
mod triangle;
mod triangle_instances;
mod triangle_stencil;
mod triangle_vertex_buffer;
mod uniforms_compute;

pub use basic_compute::BasicComputeScene;
pub use clear::ClearScene;
pub use cull_modes::{CullModesScene, CullSetting};
pub use sprite_batch_compute::SpriteBatchComputeScene;
pub use texture_quad::{SamplerKind, TextureQuadScene};
pub use texture_quad_moving::TextureQuadMovingScene;
pub use triangle::TriangleScene;
pub use triangle_instances::TriangleInstancesScene;
pub use triangle_stencil::TriangleStencilScene;
pub use triangle_vertex_buffer::TriangleVertexBufferScene;
pub use uniforms_compute::UniformsComputeScene;

#[cfg(test)]
pub(crate) mod test_input {
    use gpulab_engine::input::{InputEvent, InputFrame, Key};

    pub fn press(key: Key) -> InputFrame {
        [InputEvent::key_down(key)].into_iter().collect()
    }

    pub fn idle() -> InputFrame {
        InputFrame::default()
    }
}
