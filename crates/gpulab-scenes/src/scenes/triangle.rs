use anyhow::Result;

use gpulab_engine::core::{AppControl, Scene};
use gpulab_engine::device::{GraphicsPipelineInfo, Renderer, ScissorRect, Viewport};
use gpulab_engine::input::{InputFrame, InputState};
use gpulab_engine::resource::Tracked;

const SMALL_VIEWPORT: Viewport = Viewport {
    x: 160.0,
    y: 120.0,
    w: 320.0,
    h: 240.0,
    min_depth: 0.1,
    max_depth: 1.0,
};

const SCISSOR_RECT: ScissorRect = ScissorRect {
    x: 320,
    y: 240,
    w: 320,
    h: 240,
};

/// Triangle generated in the vertex shader from the vertex index.
///
/// Left toggles wireframe, down toggles a smaller viewport, right toggles a
/// scissor rectangle over the bottom-right quarter.
#[derive(Default)]
pub struct TriangleScene {
    input: InputState,
    wireframe: bool,
    small_viewport: bool,
    scissor: bool,
    resources: Option<Resources>,
}

struct Resources {
    fill: Tracked<wgpu::RenderPipeline>,
    /// `None` when the device has no line polygon mode.
    line: Option<Tracked<wgpu::RenderPipeline>>,
}

impl TriangleScene {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Clamps `rect` to a `width`x`height` target; scissor rects may not exceed it.
fn clamp_scissor(rect: ScissorRect, width: u32, height: u32) -> ScissorRect {
    let x = rect.x.min(width);
    let y = rect.y.min(height);
    ScissorRect {
        x,
        y,
        w: rect.w.min(width - x),
        h: rect.h.min(height - y),
    }
}

impl Scene for TriangleScene {
    fn name(&self) -> &'static str {
        "triangle"
    }

    fn load(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let vertex = renderer.load_shader("RawTriangle.vert")?;
        let fragment = renderer.load_shader("SolidColor.frag")?;

        let mut info = GraphicsPipelineInfo::new("triangle fill", &vertex, &fragment);
        let fill = renderer.create_graphics_pipeline(&info)?;

        let line = if renderer.supports_features(wgpu::Features::POLYGON_MODE_LINE) {
            info.label = "triangle line";
            info.primitive.polygon_mode = wgpu::PolygonMode::Line;
            Some(renderer.create_graphics_pipeline(&info)?)
        } else {
            log::info!("line polygon mode unsupported; wireframe toggle disabled");
            None
        };

        renderer.release((vertex, fragment));
        self.resources = Some(Resources { fill, line });
        Ok(())
    }

    fn update(&mut self, _dt: f32, input: &InputFrame) -> AppControl {
        let control = self.input.manage(input);

        if self.input.left {
            self.wireframe = !self.wireframe;
            log::info!("wireframe: {}", self.wireframe);
        }
        if self.input.down {
            self.small_viewport = !self.small_viewport;
            log::info!("small viewport: {}", self.small_viewport);
        }
        if self.input.right {
            self.scissor = !self.scissor;
            log::info!("scissor rect: {}", self.scissor);
        }

        control
    }

    fn draw(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let Some(res) = self.resources.as_ref() else {
            return Ok(());
        };

        renderer.begin(None)?;

        let pipeline = match (&res.line, self.wireframe) {
            (Some(line), true) => line,
            _ => &res.fill,
        };
        renderer.bind_graphics_pipeline(pipeline);

        if self.small_viewport {
            renderer.set_viewport(SMALL_VIEWPORT);
        }
        if self.scissor {
            let (w, h) = renderer.window_size_in_pixels();
            renderer.set_scissor(clamp_scissor(SCISSOR_RECT, w, h));
        }

        renderer.draw_primitives(3, 1, 0, 0);
        renderer.end()
    }

    fn unload(&mut self, renderer: &mut Renderer<'_>) {
        renderer.release(self.resources.take());
    }
}
