use anyhow::{bail, Result};

use gpulab_engine::core::{AppControl, Scene};
use gpulab_engine::device::{DepthStencilTarget, GraphicsPipelineInfo, Renderer};
use gpulab_engine::input::{InputFrame, InputState};
use gpulab_engine::resource::Tracked;

use crate::common::{upload_geometry, Geometry};
use crate::vertex::PositionColorVertex;

/// Small yellow masking triangle (0..3) and the full-size colored one (3..6).
const VERTICES: [PositionColorVertex; 6] = [
    PositionColorVertex::new(-0.5, -0.5, 0.0, 255, 255, 0, 255),
    PositionColorVertex::new(0.5, -0.5, 0.0, 255, 255, 0, 255),
    PositionColorVertex::new(0.0, 0.5, 0.0, 255, 255, 0, 255),
    PositionColorVertex::new(-1.0, -1.0, 0.0, 255, 0, 0, 255),
    PositionColorVertex::new(1.0, -1.0, 0.0, 0, 255, 0, 255),
    PositionColorVertex::new(0.0, 1.0, 0.0, 0, 0, 255, 255),
];

const MASK_REFERENCE: u32 = 1;

/// Stencil masking: the masker writes the reference value where the small
/// triangle covers, then the maskee draws only where the stencil is still 0.
#[derive(Default)]
pub struct TriangleStencilScene {
    input: InputState,
    resources: Option<Resources>,
}

struct Resources {
    masker: Tracked<wgpu::RenderPipeline>,
    maskee: Tracked<wgpu::RenderPipeline>,
    geometry: Geometry,
    depth_stencil: Tracked<wgpu::Texture>,
    depth_stencil_view: wgpu::TextureView,
}

impl TriangleStencilScene {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Picks D24S8 when it can be a render attachment, then D32FS8 when the
/// device enabled it.
fn choose_depth_stencil_format(renderer: &Renderer<'_>) -> Option<wgpu::TextureFormat> {
    let usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
    if renderer.texture_supports_format(wgpu::TextureFormat::Depth24PlusStencil8, usage) {
        return Some(wgpu::TextureFormat::Depth24PlusStencil8);
    }
    if renderer.supports_features(wgpu::Features::DEPTH32FLOAT_STENCIL8)
        && renderer.texture_supports_format(wgpu::TextureFormat::Depth32FloatStencil8, usage)
    {
        return Some(wgpu::TextureFormat::Depth32FloatStencil8);
    }
    None
}

fn stencil_state(
    format: wgpu::TextureFormat,
    face: wgpu::StencilFaceState,
    write_mask: u32,
) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format,
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::Always,
        stencil: wgpu::StencilState {
            front: face,
            back: face,
            read_mask: 0xFF,
            write_mask,
        },
        bias: wgpu::DepthBiasState::default(),
    }
}

fn masker_face() -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: wgpu::CompareFunction::Never,
        fail_op: wgpu::StencilOperation::Replace,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op: wgpu::StencilOperation::Keep,
    }
}

fn maskee_face() -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: wgpu::CompareFunction::Equal,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op: wgpu::StencilOperation::Keep,
    }
}

impl Scene for TriangleStencilScene {
    fn name(&self) -> &'static str {
        "triangle-stencil"
    }

    fn load(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let Some(format) = choose_depth_stencil_format(renderer) else {
            bail!("no supported depth-stencil format (tried D24S8 and D32FS8)");
        };
        log::info!("depth-stencil format: {format:?}");

        let vertex = renderer.load_shader("PositionColor.vert")?;
        let fragment = renderer.load_shader("SolidColor.frag")?;
        let layouts = [PositionColorVertex::layout()];

        let mut info = GraphicsPipelineInfo::new("stencil masker", &vertex, &fragment);
        info.vertex_buffers = &layouts;
        info.depth_stencil = Some(stencil_state(format, masker_face(), 0xFF));
        let masker = renderer.create_graphics_pipeline(&info)?;

        info.label = "stencil maskee";
        info.depth_stencil = Some(stencil_state(format, maskee_face(), 0));
        let maskee = renderer.create_graphics_pipeline(&info)?;
        renderer.release((vertex, fragment));

        let (width, height) = renderer.window_size_in_pixels();
        let depth_stencil = renderer.create_texture(&wgpu::TextureDescriptor {
            label: Some("stencil target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_stencil_view = depth_stencil.create_view(&wgpu::TextureViewDescriptor::default());

        let geometry = upload_geometry(renderer, "stencil vertices", &VERTICES, None)?;

        self.resources = Some(Resources {
            masker,
            maskee,
            geometry,
            depth_stencil,
            depth_stencil_view,
        });
        Ok(())
    }

    fn update(&mut self, _dt: f32, input: &InputFrame) -> AppControl {
        self.input.manage(input)
    }

    fn draw(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let Some(res) = self.resources.as_ref() else {
            return Ok(());
        };

        renderer.begin(Some(DepthStencilTarget {
            view: &res.depth_stencil_view,
            format: res.depth_stencil.format(),
            clear_depth: 0.0,
            clear_stencil: 0,
        }))?;
        renderer.bind_vertex_buffer(0, &res.geometry.vertices);

        renderer.bind_graphics_pipeline(&res.masker);
        renderer.set_stencil_reference(MASK_REFERENCE);
        renderer.draw_primitives(3, 1, 0, 0);

        renderer.bind_graphics_pipeline(&res.maskee);
        renderer.set_stencil_reference(0);
        renderer.draw_primitives(3, 1, 3, 0);

        renderer.end()
    }

    fn unload(&mut self, renderer: &mut Renderer<'_>) {
        renderer.release(self.resources.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masker_only_writes_stencil() {
        let state = stencil_state(wgpu::TextureFormat::Depth24PlusStencil8, masker_face(), 0xFF);
        assert_eq!(state.stencil.front.compare, wgpu::CompareFunction::Never);
        assert_eq!(state.stencil.front.fail_op, wgpu::StencilOperation::Replace);
        assert_eq!(state.stencil.front, state.stencil.back);
        assert!(!state.depth_write_enabled);
    }

    #[test]
    fn maskee_leaves_stencil_untouched() {
        let state = stencil_state(wgpu::TextureFormat::Depth24PlusStencil8, maskee_face(), 0);
        assert_eq!(state.stencil.write_mask, 0);
        assert_eq!(state.stencil.front.compare, wgpu::CompareFunction::Equal);
        assert!(state.stencil.is_enabled());
    }
}
