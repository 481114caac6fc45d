use anyhow::Result;

use gpulab_engine::core::{AppControl, Scene};
use gpulab_engine::device::{GraphicsPipelineInfo, Renderer};
use gpulab_engine::input::{InputFrame, InputState};
use gpulab_engine::resource::Tracked;

use crate::common::{upload_geometry, Geometry};
use crate::vertex::PositionColorVertex;

/// Three copies of the same triangle: RGB, then orange/green/cyan, then white.
const VERTICES: [PositionColorVertex; 9] = [
    PositionColorVertex::new(-1.0, -1.0, 0.0, 255, 0, 0, 255),
    PositionColorVertex::new(1.0, -1.0, 0.0, 0, 255, 0, 255),
    PositionColorVertex::new(0.0, 1.0, 0.0, 0, 0, 255, 255),
    PositionColorVertex::new(-1.0, -1.0, 0.0, 255, 165, 0, 255),
    PositionColorVertex::new(1.0, -1.0, 0.0, 0, 128, 0, 255),
    PositionColorVertex::new(0.0, 1.0, 0.0, 0, 255, 255, 255),
    PositionColorVertex::new(-1.0, -1.0, 0.0, 255, 255, 255, 255),
    PositionColorVertex::new(1.0, -1.0, 0.0, 255, 255, 255, 255),
    PositionColorVertex::new(0.0, 1.0, 0.0, 255, 255, 255, 255),
];

const INDICES: [u16; 6] = [0, 1, 2, 3, 4, 5];

const INSTANCES: u32 = 16;
const OFFSET: u32 = 3;

/// Sixteen instances of a triangle laid out on a 4x4 grid.
///
/// Left toggles the vertex offset, right the index offset and up switches
/// between indexed and non-indexed drawing.
#[derive(Default)]
pub struct TriangleInstancesScene {
    input: InputState,
    vertex_offset: bool,
    index_offset: bool,
    indexed: bool,
    resources: Option<Resources>,
}

struct Resources {
    pipeline: Tracked<wgpu::RenderPipeline>,
    geometry: Geometry,
}

impl TriangleInstancesScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// (first vertex or base vertex, first index) for the next draw.
    fn offsets(&self) -> (u32, u32) {
        (
            if self.vertex_offset { OFFSET } else { 0 },
            if self.index_offset { OFFSET } else { 0 },
        )
    }
}

impl Scene for TriangleInstancesScene {
    fn name(&self) -> &'static str {
        "triangle-instances"
    }

    fn load(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let vertex = renderer.load_shader("PositionColorInstanced.vert")?;
        let fragment = renderer.load_shader("SolidColor.frag")?;

        let layouts = [PositionColorVertex::layout()];
        let mut info = GraphicsPipelineInfo::new("triangle instances", &vertex, &fragment);
        info.vertex_buffers = &layouts;
        let pipeline = renderer.create_graphics_pipeline(&info)?;
        renderer.release((vertex, fragment));

        let geometry = upload_geometry(renderer, "instanced triangle", &VERTICES, Some(&INDICES[..]))?;

        self.resources = Some(Resources { pipeline, geometry });
        Ok(())
    }

    fn update(&mut self, _dt: f32, input: &InputFrame) -> AppControl {
        let control = self.input.manage(input);

        if self.input.left {
            self.vertex_offset = !self.vertex_offset;
            log::info!("using vertex offset: {}", self.vertex_offset);
        }
        if self.input.right {
            self.index_offset = !self.index_offset;
            log::info!("using index offset: {}", self.index_offset);
        }
        if self.input.up {
            self.indexed = !self.indexed;
            log::info!("using index buffer: {}", self.indexed);
        }

        control
    }

    fn draw(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let Some(res) = self.resources.as_ref() else {
            return Ok(());
        };
        let (vertex_offset, index_offset) = self.offsets();

        renderer.begin(None)?;
        renderer.bind_graphics_pipeline(&res.pipeline);
        renderer.bind_vertex_buffer(0, &res.geometry.vertices);

        match (&res.geometry.indices, self.indexed) {
            (Some(indices), true) => {
                renderer.bind_index_buffer(indices, wgpu::IndexFormat::Uint16);
                renderer.draw_indexed_primitives(3, INSTANCES, index_offset, vertex_offset as i32, 0);
            }
            _ => renderer.draw_primitives(3, INSTANCES, vertex_offset, 0),
        }

        renderer.end()
    }

    fn unload(&mut self, renderer: &mut Renderer<'_>) {
        renderer.release(self.resources.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::test_input::press;
    use gpulab_engine::input::Key;

    #[test]
    fn toggles_drive_draw_offsets() {
        let mut scene = TriangleInstancesScene::new();
        assert_eq!(scene.offsets(), (0, 0));

        scene.update(0.016, &press(Key::ArrowLeft));
        assert_eq!(scene.offsets(), (3, 0));

        scene.update(0.016, &press(Key::ArrowRight));
        assert_eq!(scene.offsets(), (3, 3));

        scene.update(0.016, &press(Key::ArrowUp));
        assert!(scene.indexed);

        scene.update(0.016, &press(Key::ArrowLeft));
        assert_eq!(scene.offsets(), (0, 3));
    }

    #[test]
    fn offsets_stay_inside_the_buffers() {
        assert!(OFFSET as usize + 3 <= INDICES.len());
        assert!(2 * OFFSET as usize + 3 <= VERTICES.len());
    }
}
