use anyhow::Result;

use gpulab_engine::core::{AppControl, Scene};
use gpulab_engine::device::{binding, ComputePipelineInfo, GraphicsPipelineInfo, Renderer};
use gpulab_engine::input::{InputFrame, InputState};
use gpulab_engine::resource::Tracked;

use crate::common::{
    texture_sampler_group, texture_sampler_layout, upload_geometry, Geometry, QUAD_INDICES,
};
use crate::vertex::PositionTextureVertex;

pub(crate) const FULLSCREEN_QUAD: [PositionTextureVertex; 4] = [
    PositionTextureVertex::new(-1.0, 1.0, 0.0, 0.0, 0.0),
    PositionTextureVertex::new(1.0, 1.0, 0.0, 1.0, 0.0),
    PositionTextureVertex::new(1.0, -1.0, 0.0, 1.0, 1.0),
    PositionTextureVertex::new(-1.0, -1.0, 0.0, 0.0, 1.0),
];

/// Workgroup edge of the 2D texture compute shaders.
pub(crate) const WORKGROUP_SIZE: u32 = 8;

/// Workgroups needed to cover a `width`x`height` texture.
pub(crate) fn workgroups_for(width: u32, height: u32) -> (u32, u32) {
    (
        width.div_ceil(WORKGROUP_SIZE),
        height.div_ceil(WORKGROUP_SIZE),
    )
}

/// Texture the size of the window, written by compute and sampled by draws.
pub(crate) fn create_screen_texture(renderer: &Renderer<'_>, label: &str) -> Tracked<wgpu::Texture> {
    let (width, height) = renderer.window_size_in_pixels();
    renderer.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}

/// A compute shader fills a screen-sized texture once at load time; every
/// frame draws that texture over a fullscreen quad.
#[derive(Default)]
pub struct BasicComputeScene {
    input: InputState,
    resources: Option<Resources>,
}

struct Resources {
    pipeline: Tracked<wgpu::RenderPipeline>,
    geometry: Geometry,
    _screen: Tracked<wgpu::Texture>,
    _sampler: Tracked<wgpu::Sampler>,
    group: wgpu::BindGroup,
}

impl BasicComputeScene {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scene for BasicComputeScene {
    fn name(&self) -> &'static str {
        "basic-compute"
    }

    fn load(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let vertex = renderer.load_shader("TexturedQuad.vert")?;
        let fragment = renderer.load_shader("TexturedQuad.frag")?;

        let texture_layout = texture_sampler_layout(renderer, "basic compute draw");
        let layouts = [PositionTextureVertex::layout()];
        let bind_group_layouts = [&texture_layout];
        let mut info = GraphicsPipelineInfo::new("basic compute draw", &vertex, &fragment);
        info.vertex_buffers = &layouts;
        info.bind_group_layouts = &bind_group_layouts;
        let pipeline = renderer.create_graphics_pipeline(&info)?;
        renderer.release((vertex, fragment));

        let storage_layout = renderer.create_bind_group_layout(
            "fill texture",
            &[binding::storage_texture(0, wgpu::TextureFormat::Rgba8Unorm)],
        );
        let fill = renderer.create_compute_pipeline_from_shader(&ComputePipelineInfo {
            shader: "FillTexture.comp",
            bind_group_layouts: &[&storage_layout],
        })?;

        let screen = create_screen_texture(renderer, "basic compute screen");
        let view = screen.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = renderer.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("basic compute"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            ..Default::default()
        });

        let geometry =
            upload_geometry(renderer, "basic compute quad", &FULLSCREEN_QUAD, Some(&QUAD_INDICES[..]))?;

        let storage_group = renderer.create_bind_group(
            "fill texture",
            &storage_layout,
            &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        );
        let size = screen.size();
        let (x, y) = workgroups_for(size.width, size.height);

        renderer.begin_compute()?;
        renderer.bind_compute_pipeline(&fill);
        renderer.bind_compute_group(0, &storage_group, &[]);
        renderer.dispatch_compute(x, y, 1);
        renderer.end_compute()?;

        // The texture keeps its contents; the fill pipeline is not needed again.
        renderer.release(fill);

        let group = texture_sampler_group(renderer, "basic compute draw", &texture_layout, &view, &sampler);
        self.resources = Some(Resources {
            pipeline,
            geometry,
            _screen: screen,
            _sampler: sampler,
            group,
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
        let Some(indices) = res.geometry.indices.as_ref() else {
            return Ok(());
        };

        renderer.begin(None)?;
        renderer.bind_graphics_pipeline(&res.pipeline);
        renderer.bind_vertex_buffer(0, &res.geometry.vertices);
        renderer.bind_index_buffer(indices, wgpu::IndexFormat::Uint16);
        renderer.bind_group(0, &res.group, &[]);
        renderer.draw_indexed_primitives(6, 1, 0, 0, 0);
        renderer.end()
    }

    fn unload(&mut self, renderer: &mut Renderer<'_>) {
        renderer.release(self.resources.take());
    }
}
