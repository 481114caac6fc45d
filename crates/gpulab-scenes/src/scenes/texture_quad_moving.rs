use std::f32::consts::TAU;
use std::num::NonZeroU64;

use anyhow::Result;
use glam::{Mat4, Vec3, Vec4};

use gpulab_engine::core::{AppControl, Scene};
use gpulab_engine::device::{alpha_blend, binding, GraphicsPipelineInfo, Renderer};
use gpulab_engine::input::{InputFrame, InputState};
use gpulab_engine::resource::Tracked;

use crate::common::{
    load_image_texture, texture_sampler_group, texture_sampler_layout, upload_geometry, Geometry,
    QUAD_INDICES,
};
use crate::vertex::PositionTextureVertex;

const VERTICES: [PositionTextureVertex; 4] = [
    PositionTextureVertex::new(-0.5, -0.5, 0.0, 0.0, 0.0),
    PositionTextureVertex::new(0.5, -0.5, 0.0, 1.0, 0.0),
    PositionTextureVertex::new(0.5, 0.5, 0.0, 1.0, 1.0),
    PositionTextureVertex::new(-0.5, 0.5, 0.0, 0.0, 1.0),
];

const QUADS: usize = 4;
const TRANSFORM_SIZE: u64 = std::mem::size_of::<Mat4>() as u64;
const COLOR_SIZE: u64 = std::mem::size_of::<Vec4>() as u64;

/// Per-quad uniforms: the vertex transform and the fragment multiply color.
#[derive(Debug, Copy, Clone, PartialEq)]
struct QuadUniforms {
    transform: Mat4,
    multiply: Vec4,
}

/// Transforms and colors of the four quads at `time` seconds.
fn quad_uniforms(time: f32) -> [QuadUniforms; QUADS] {
    let quad = |angle: f32, x: f32, y: f32, green: f32| QuadUniforms {
        transform: Mat4::from_translation(Vec3::new(x, y, 0.0)) * Mat4::from_rotation_z(angle),
        multiply: Vec4::new(1.0, green, 1.0, 1.0),
    };

    [
        quad(time, -0.5, -0.5, 0.5 + time.sin() * 0.5),
        quad(TAU - time, 0.5, -0.5, 0.5 + time.cos() * 0.5),
        quad(time, -0.5, 0.5, 0.5 + time.sin() * 0.2),
        quad(time, 0.5, 0.5, 0.5 + time.cos()),
    ]
}

fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Four textured quads rotating over time, each drawn with its own transform
/// and multiply color through dynamic uniform offsets.
#[derive(Default)]
pub struct TextureQuadMovingScene {
    input: InputState,
    time: f32,
    resources: Option<Resources>,
}

struct Resources {
    pipeline: Tracked<wgpu::RenderPipeline>,
    geometry: Geometry,
    _texture: Tracked<wgpu::Texture>,
    _sampler: Tracked<wgpu::Sampler>,
    texture_group: wgpu::BindGroup,
    transforms: Tracked<wgpu::Buffer>,
    colors: Tracked<wgpu::Buffer>,
    uniform_group: wgpu::BindGroup,
    /// Distance between two quads' uniforms in both buffers.
    stride: u64,
}

impl TextureQuadMovingScene {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scene for TextureQuadMovingScene {
    fn name(&self) -> &'static str {
        "texture-quad-moving"
    }

    fn load(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        self.time = 0.0;

        let vertex = renderer.load_shader("TexturedQuadWithMatrix.vert")?;
        let fragment = renderer.load_shader("TexturedQuadWithMultiplyColor.frag")?;

        let texture_layout = texture_sampler_layout(renderer, "moving quad texture");
        let uniform_layout = renderer.create_bind_group_layout(
            "moving quad uniforms",
            &[
                binding::uniform_buffer(0, wgpu::ShaderStages::VERTEX, TRANSFORM_SIZE, true),
                binding::uniform_buffer(1, wgpu::ShaderStages::FRAGMENT, COLOR_SIZE, true),
            ],
        );

        let layouts = [PositionTextureVertex::layout()];
        let bind_group_layouts = [&texture_layout, &uniform_layout];
        let mut info = GraphicsPipelineInfo::new("moving quad", &vertex, &fragment);
        info.vertex_buffers = &layouts;
        info.bind_group_layouts = &bind_group_layouts;
        info.blend = Some(alpha_blend());
        let pipeline = renderer.create_graphics_pipeline(&info)?;
        renderer.release((vertex, fragment));

        let geometry =
            upload_geometry(renderer, "moving quad", &VERTICES, Some(&QUAD_INDICES[..]))?;
        let texture = load_image_texture(renderer, "ravioli.bmp")?;
        let sampler = renderer.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("moving quad"),
            ..Default::default()
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let texture_group =
            texture_sampler_group(renderer, "moving quad texture", &texture_layout, &view, &sampler);

        let stride = align_to(TRANSFORM_SIZE, u64::from(renderer.uniform_offset_alignment()));
        let usage = wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST;
        let transforms = renderer.create_buffer("moving quad transforms", usage, stride * QUADS as u64);
        let colors = renderer.create_buffer("moving quad colors", usage, stride * QUADS as u64);

        let uniform_group = renderer.create_bind_group(
            "moving quad uniforms",
            &uniform_layout,
            &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &transforms,
                        offset: 0,
                        size: NonZeroU64::new(TRANSFORM_SIZE),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &colors,
                        offset: 0,
                        size: NonZeroU64::new(COLOR_SIZE),
                    }),
                },
            ],
        );

        self.resources = Some(Resources {
            pipeline,
            geometry,
            _texture: texture,
            _sampler: sampler,
            texture_group,
            transforms,
            colors,
            uniform_group,
            stride,
        });
        Ok(())
    }

    fn update(&mut self, dt: f32, input: &InputFrame) -> AppControl {
        self.time += dt;
        self.input.manage(input)
    }

    fn draw(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let Some(res) = self.resources.as_ref() else {
            return Ok(());
        };
        let Some(indices) = res.geometry.indices.as_ref() else {
            return Ok(());
        };

        let uniforms = quad_uniforms(self.time);
        for (i, quad) in uniforms.iter().enumerate() {
            let offset = res.stride * i as u64;
            renderer.write_buffer(&res.transforms, offset, bytemuck::bytes_of(&quad.transform));
            renderer.write_buffer(&res.colors, offset, bytemuck::bytes_of(&quad.multiply));
        }

        renderer.begin(None)?;
        renderer.bind_graphics_pipeline(&res.pipeline);
        renderer.bind_vertex_buffer(0, &res.geometry.vertices);
        renderer.bind_index_buffer(indices, wgpu::IndexFormat::Uint16);
        renderer.bind_group(0, &res.texture_group, &[]);

        for i in 0..QUADS {
            let offset = (res.stride * i as u64) as u32;
            renderer.bind_group(1, &res.uniform_group, &[offset, offset]);
            renderer.draw_indexed_primitives(6, 1, 0, 0, 0);
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

    #[test]
    fn quads_sit_in_the_four_quadrants() {
        let quads = quad_uniforms(0.0);
        let centers: Vec<Vec4> = quads
            .iter()
            .map(|q| q.transform * Vec4::new(0.0, 0.0, 0.0, 1.0))
            .collect();
        assert_eq!(centers[0], Vec4::new(-0.5, -0.5, 0.0, 1.0));
        assert_eq!(centers[1], Vec4::new(0.5, -0.5, 0.0, 1.0));
        assert_eq!(centers[2], Vec4::new(-0.5, 0.5, 0.0, 1.0));
        assert_eq!(centers[3], Vec4::new(0.5, 0.5, 0.0, 1.0));
    }

    #[test]
    fn rotation_happens_before_translation() {
        let quads = quad_uniforms(std::f32::consts::FRAC_PI_2);
        let corner = quads[0].transform * Vec4::new(0.5, 0.0, 0.0, 1.0);
        assert!((corner.x - -0.5).abs() < 1e-5);
        assert!((corner.y - 0.0).abs() < 1e-5);
    }

    #[test]
    fn multiply_colors_only_vary_green() {
        for quad in quad_uniforms(1.3) {
            assert_eq!(quad.multiply.x, 1.0);
            assert_eq!(quad.multiply.z, 1.0);
            assert_eq!(quad.multiply.w, 1.0);
        }
        assert_eq!(quad_uniforms(0.0)[3].multiply.y, 1.5);
    }

    #[test]
    fn time_accumulates_dt() {
        let mut scene = TextureQuadMovingScene::new();
        scene.update(0.25, &InputFrame::default());
        scene.update(0.5, &InputFrame::default());
        assert_eq!(scene.time, 0.75);
    }

    #[test]
    fn uniform_stride_respects_alignment() {
        assert_eq!(align_to(TRANSFORM_SIZE, 256), 256);
        assert_eq!(align_to(TRANSFORM_SIZE, 64), 64);
        assert_eq!(align_to(300, 256), 512);
    }
}
