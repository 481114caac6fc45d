use std::fmt;

use anyhow::Result;

use gpulab_engine::core::{AppControl, Scene};
use gpulab_engine::device::{GraphicsPipelineInfo, Renderer, Viewport};
use gpulab_engine::input::{InputFrame, InputState};
use gpulab_engine::resource::Tracked;

use crate::common::{upload_geometry, Geometry};
use crate::vertex::PositionColorVertex;

/// Counter-clockwise triangle (0..3) followed by its clockwise mirror (3..6).
const VERTICES: [PositionColorVertex; 6] = [
    PositionColorVertex::new(-1.0, -1.0, 0.0, 255, 0, 0, 255),
    PositionColorVertex::new(1.0, -1.0, 0.0, 0, 255, 0, 255),
    PositionColorVertex::new(0.0, 1.0, 0.0, 0, 0, 255, 255),
    PositionColorVertex::new(0.0, 1.0, 0.0, 0, 0, 255, 255),
    PositionColorVertex::new(1.0, -1.0, 0.0, 0, 255, 0, 255),
    PositionColorVertex::new(-1.0, -1.0, 0.0, 255, 0, 0, 255),
];

/// Front-face winding and cull mode of one pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CullSetting {
    pub front_face: wgpu::FrontFace,
    pub cull_mode: Option<wgpu::Face>,
}

impl CullSetting {
    pub const ALL: [CullSetting; 6] = [
        CullSetting::new(wgpu::FrontFace::Ccw, None),
        CullSetting::new(wgpu::FrontFace::Ccw, Some(wgpu::Face::Front)),
        CullSetting::new(wgpu::FrontFace::Ccw, Some(wgpu::Face::Back)),
        CullSetting::new(wgpu::FrontFace::Cw, None),
        CullSetting::new(wgpu::FrontFace::Cw, Some(wgpu::Face::Front)),
        CullSetting::new(wgpu::FrontFace::Cw, Some(wgpu::Face::Back)),
    ];

    const fn new(front_face: wgpu::FrontFace, cull_mode: Option<wgpu::Face>) -> Self {
        Self {
            front_face,
            cull_mode,
        }
    }
}

impl fmt::Display for CullSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let winding = if self.front_face == wgpu::FrontFace::Ccw {
            "CCW"
        } else {
            "CW"
        };
        let cull = match self.cull_mode {
            None => "CullNone",
            Some(wgpu::Face::Front) => "CullFront",
            Some(_) => "CullBack",
        };
        write!(f, "{winding}_{cull}")
    }
}

/// Draws a clockwise triangle on the left half and a counter-clockwise one
/// on the right half under one of six cull settings; left/right cycle them.
#[derive(Default)]
pub struct CullModesScene {
    input: InputState,
    current: usize,
    resources: Option<Resources>,
}

struct Resources {
    pipelines: Vec<Tracked<wgpu::RenderPipeline>>,
    geometry: Geometry,
}

impl CullModesScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> CullSetting {
        CullSetting::ALL[self.current]
    }
}

impl Scene for CullModesScene {
    fn name(&self) -> &'static str {
        "cull-modes"
    }

    fn load(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let vertex = renderer.load_shader("PositionColor.vert")?;
        let fragment = renderer.load_shader("SolidColor.frag")?;
        let layouts = [PositionColorVertex::layout()];

        let mut pipelines = Vec::with_capacity(CullSetting::ALL.len());
        for setting in CullSetting::ALL {
            let label = setting.to_string();
            let mut info = GraphicsPipelineInfo::new(&label, &vertex, &fragment);
            info.vertex_buffers = &layouts;
            info.primitive.front_face = setting.front_face;
            info.primitive.cull_mode = setting.cull_mode;
            pipelines.push(renderer.create_graphics_pipeline(&info)?);
        }
        renderer.release((vertex, fragment));

        let geometry = upload_geometry(renderer, "cull mode vertices", &VERTICES, None)?;

        log::info!("cull setting: {}", self.current());
        self.resources = Some(Resources {
            pipelines,
            geometry,
        });
        Ok(())
    }

    fn update(&mut self, _dt: f32, input: &InputFrame) -> AppControl {
        let control = self.input.manage(input);
        let count = CullSetting::ALL.len();

        let previous = self.current;
        if self.input.left {
            self.current = (self.current + count - 1) % count;
        }
        if self.input.right {
            self.current = (self.current + 1) % count;
        }
        if self.current != previous {
            log::info!("cull setting: {}", self.current());
        }

        control
    }

    fn draw(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let Some(res) = self.resources.as_ref() else {
            return Ok(());
        };

        let (w, h) = renderer.window_size_in_pixels();
        let half = w as f32 / 2.0;
        let viewport = |x: f32| Viewport {
            x,
            y: 0.0,
            w: half,
            h: h as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };

        renderer.begin(None)?;
        renderer.bind_graphics_pipeline(&res.pipelines[self.current]);
        renderer.bind_vertex_buffer(0, &res.geometry.vertices);

        renderer.set_viewport(viewport(0.0));
        renderer.draw_primitives(3, 1, 3, 0);

        renderer.set_viewport(viewport(half));
        renderer.draw_primitives(3, 1, 0, 0);

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
    fn settings_are_named_by_winding_then_cull() {
        let names: Vec<String> = CullSetting::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            [
                "CCW_CullNone",
                "CCW_CullFront",
                "CCW_CullBack",
                "CW_CullNone",
                "CW_CullFront",
                "CW_CullBack",
            ]
        );
    }

    #[test]
    fn arrows_cycle_with_wraparound() {
        let mut scene = CullModesScene::new();
        scene.update(0.016, &press(Key::ArrowLeft));
        assert_eq!(scene.current(), CullSetting::ALL[5]);

        scene.update(0.016, &press(Key::ArrowRight));
        scene.update(0.016, &press(Key::ArrowRight));
        assert_eq!(scene.current(), CullSetting::ALL[1]);
    }

    #[test]
    fn second_triangle_mirrors_the_first() {
        for i in 0..3 {
            assert_eq!(VERTICES[i], VERTICES[5 - i]);
        }
    }
}
