use anyhow::Result;

use gpulab_engine::core::{AppControl, Scene};
use gpulab_engine::device::{GraphicsPipelineInfo, Renderer};
use gpulab_engine::input::{InputFrame, InputState};
use gpulab_engine::resource::Tracked;

use crate::common::{upload_geometry, Geometry};
use crate::vertex::PositionColorVertex;

const VERTICES: [PositionColorVertex; 3] = [
    PositionColorVertex::new(-1.0, -1.0, 0.0, 255, 0, 0, 255),
    PositionColorVertex::new(1.0, -1.0, 0.0, 0, 255, 0, 255),
    PositionColorVertex::new(0.0, 1.0, 0.0, 0, 0, 255, 255),
];

/// Triangle read from a vertex buffer uploaded at load time.
#[derive(Default)]
pub struct TriangleVertexBufferScene {
    input: InputState,
    resources: Option<Resources>,
}

struct Resources {
    pipeline: Tracked<wgpu::RenderPipeline>,
    geometry: Geometry,
}

impl TriangleVertexBufferScene {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scene for TriangleVertexBufferScene {
    fn name(&self) -> &'static str {
        "triangle-vertex-buffer"
    }

    fn load(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let vertex = renderer.load_shader("PositionColor.vert")?;
        let fragment = renderer.load_shader("SolidColor.frag")?;

        let layouts = [PositionColorVertex::layout()];
        let mut info = GraphicsPipelineInfo::new("triangle vertex buffer", &vertex, &fragment);
        info.vertex_buffers = &layouts;
        let pipeline = renderer.create_graphics_pipeline(&info)?;
        renderer.release((vertex, fragment));

        let geometry = upload_geometry(renderer, "triangle vertices", &VERTICES, None)?;

        self.resources = Some(Resources { pipeline, geometry });
        Ok(())
    }

    fn update(&mut self, _dt: f32, input: &InputFrame) -> AppControl {
        self.input.manage(input)
    }

    fn draw(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let Some(res) = self.resources.as_ref() else {
            return Ok(());
        };

        renderer.begin(None)?;
        renderer.bind_graphics_pipeline(&res.pipeline);
        renderer.bind_vertex_buffer(0, &res.geometry.vertices);
        renderer.draw_primitives(3, 1, 0, 0);
        renderer.end()
    }

    fn unload(&mut self, renderer: &mut Renderer<'_>) {
        renderer.release(self.resources.take());
    }
}
