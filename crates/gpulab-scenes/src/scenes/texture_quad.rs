use anyhow::Result;

use gpulab_engine::core::{AppControl, Scene};
use gpulab_engine::device::{GraphicsPipelineInfo, Renderer};
use gpulab_engine::input::{InputFrame, InputState};
use gpulab_engine::resource::Tracked;

use crate::common::{
    load_image_texture, texture_sampler_group, texture_sampler_layout, upload_geometry, Geometry,
    QUAD_INDICES,
};
use crate::vertex::PositionTextureVertex;

/// Fullscreen quad with UVs running to 4 so the address mode shows.
const VERTICES: [PositionTextureVertex; 4] = [
    PositionTextureVertex::new(-1.0, 1.0, 0.0, 0.0, 0.0),
    PositionTextureVertex::new(1.0, 1.0, 0.0, 4.0, 0.0),
    PositionTextureVertex::new(1.0, -1.0, 0.0, 4.0, 4.0),
    PositionTextureVertex::new(-1.0, -1.0, 0.0, 0.0, 4.0),
];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SamplerKind {
    PointClamp,
    PointWrap,
    LinearClamp,
    LinearWrap,
    AnisotropicClamp,
    AnisotropicWrap,
}

impl SamplerKind {
    pub const ALL: [SamplerKind; 6] = [
        SamplerKind::PointClamp,
        SamplerKind::PointWrap,
        SamplerKind::LinearClamp,
        SamplerKind::LinearWrap,
        SamplerKind::AnisotropicClamp,
        SamplerKind::AnisotropicWrap,
    ];

    pub fn descriptor(self) -> wgpu::SamplerDescriptor<'static> {
        use SamplerKind::*;

        let address_mode = match self {
            PointClamp | LinearClamp | AnisotropicClamp => wgpu::AddressMode::ClampToEdge,
            PointWrap | LinearWrap | AnisotropicWrap => wgpu::AddressMode::Repeat,
        };
        let (filter, mipmap_filter) = match self {
            PointClamp | PointWrap => (wgpu::FilterMode::Nearest, wgpu::MipmapFilterMode::Nearest),
            _ => (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Linear),
        };
        // Anisotropic filtering requires every filter to be linear.
        let anisotropy_clamp = match self {
            AnisotropicClamp | AnisotropicWrap => 4,
            _ => 1,
        };

        wgpu::SamplerDescriptor {
            label: Some(self.name()),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter,
            anisotropy_clamp,
            ..Default::default()
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SamplerKind::PointClamp => "PointClamp",
            SamplerKind::PointWrap => "PointWrap",
            SamplerKind::LinearClamp => "LinearClamp",
            SamplerKind::LinearWrap => "LinearWrap",
            SamplerKind::AnisotropicClamp => "AnisotropicClamp",
            SamplerKind::AnisotropicWrap => "AnisotropicWrap",
        }
    }
}

/// Textured quad; left/right cycle through six samplers.
#[derive(Default)]
pub struct TextureQuadScene {
    input: InputState,
    current: usize,
    resources: Option<Resources>,
}

struct Resources {
    pipeline: Tracked<wgpu::RenderPipeline>,
    geometry: Geometry,
    _texture: Tracked<wgpu::Texture>,
    _samplers: Vec<Tracked<wgpu::Sampler>>,
    /// One bind group per sampler, in `SamplerKind::ALL` order.
    groups: Vec<wgpu::BindGroup>,
}

impl TextureQuadScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SamplerKind {
        SamplerKind::ALL[self.current]
    }
}

impl Scene for TextureQuadScene {
    fn name(&self) -> &'static str {
        "texture-quad"
    }

    fn load(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let vertex = renderer.load_shader("TexturedQuad.vert")?;
        let fragment = renderer.load_shader("TexturedQuad.frag")?;

        let layout = texture_sampler_layout(renderer, "texture quad");
        let layouts = [PositionTextureVertex::layout()];
        let bind_group_layouts = [&layout];
        let mut info = GraphicsPipelineInfo::new("texture quad", &vertex, &fragment);
        info.vertex_buffers = &layouts;
        info.bind_group_layouts = &bind_group_layouts;
        let pipeline = renderer.create_graphics_pipeline(&info)?;
        renderer.release((vertex, fragment));

        let samplers: Vec<_> = SamplerKind::ALL
            .iter()
            .map(|kind| renderer.create_sampler(&kind.descriptor()))
            .collect();

        let geometry =
            upload_geometry(renderer, "texture quad", &VERTICES, Some(&QUAD_INDICES[..]))?;
        let texture = load_image_texture(renderer, "ravioli.bmp")?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let groups = samplers
            .iter()
            .map(|sampler| texture_sampler_group(renderer, "texture quad", &layout, &view, sampler))
            .collect();

        log::info!("sampler: {}", self.current().name());
        self.resources = Some(Resources {
            pipeline,
            geometry,
            _texture: texture,
            _samplers: samplers,
            groups,
        });
        Ok(())
    }

    fn update(&mut self, _dt: f32, input: &InputFrame) -> AppControl {
        let control = self.input.manage(input);
        let count = SamplerKind::ALL.len();

        let previous = self.current;
        if self.input.left {
            self.current = (self.current + count - 1) % count;
        }
        if self.input.right {
            self.current = (self.current + 1) % count;
        }
        if self.current != previous {
            log::info!("sampler: {}", self.current().name());
        }

        control
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
        renderer.bind_group(0, &res.groups[self.current], &[]);
        renderer.draw_indexed_primitives(6, 1, 0, 0, 0);
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
    fn anisotropic_samplers_are_fully_linear() {
        for kind in [SamplerKind::AnisotropicClamp, SamplerKind::AnisotropicWrap] {
            let desc = kind.descriptor();
            assert_eq!(desc.anisotropy_clamp, 4);
            assert_eq!(desc.mag_filter, wgpu::FilterMode::Linear);
            assert_eq!(desc.min_filter, wgpu::FilterMode::Linear);
            assert_eq!(desc.mipmap_filter, wgpu::MipmapFilterMode::Linear);
        }
    }

    #[test]
    fn wrap_samplers_repeat() {
        let wrap = SamplerKind::PointWrap.descriptor();
        assert_eq!(wrap.address_mode_u, wgpu::AddressMode::Repeat);
        let clamp = SamplerKind::PointClamp.descriptor();
        assert_eq!(clamp.address_mode_v, wgpu::AddressMode::ClampToEdge);
        assert_eq!(clamp.mag_filter, wgpu::FilterMode::Nearest);
    }

    #[test]
    fn arrows_cycle_samplers() {
        let mut scene = TextureQuadScene::new();
        assert_eq!(scene.current(), SamplerKind::PointClamp);

        scene.update(0.016, &press(Key::ArrowLeft));
        assert_eq!(scene.current(), SamplerKind::AnisotropicWrap);

        scene.update(0.016, &press(Key::ArrowRight));
        scene.update(0.016, &press(Key::ArrowRight));
        assert_eq!(scene.current(), SamplerKind::PointWrap);
    }
}
