use std::f32::consts::TAU;

use anyhow::Result;
use glam::Mat4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gpulab_engine::core::{AppControl, Scene};
use gpulab_engine::device::{binding, ComputePipelineInfo, GraphicsPipelineInfo, Renderer, TransferBuffer};
use gpulab_engine::input::{InputFrame, InputState};
use gpulab_engine::resource::Tracked;

use crate::common::{
    byte_size, create_image_texture, stage_image, texture_sampler_group, texture_sampler_layout,
    write_pod,
};
use crate::vertex::{ComputeSpriteInstance, PositionTextureColorVertex};

pub const SPRITE_COUNT: u32 = 8192;

/// Threads per workgroup of the sprite batch shader.
const THREADS: u32 = 64;
const SPRITE_SIZE: f32 = 32.0;
const RNG_SEED: u64 = 0;

const INSTANCE_BYTES: u64 = SPRITE_COUNT as u64 * std::mem::size_of::<ComputeSpriteInstance>() as u64;
const VERTEX_BYTES: u64 =
    SPRITE_COUNT as u64 * 4 * std::mem::size_of::<PositionTextureColorVertex>() as u64;

/// Pixel-space projection with the origin at the top-left of a 640x480 view.
fn view_projection() -> Mat4 {
    Mat4::orthographic_rh(0.0, 640.0, 480.0, 0.0, 0.0, -1.0)
}

/// Two triangles per sprite over its TL, TR, BL, BR vertices.
fn sprite_indices(sprites: u32) -> Vec<u32> {
    (0..sprites)
        .flat_map(|i| {
            let j = i * 4;
            [j, j + 1, j + 2, j + 3, j + 2, j + 1]
        })
        .collect()
}

fn random_sprite(rng: &mut impl Rng) -> ComputeSpriteInstance {
    ComputeSpriteInstance {
        x: rng.random_range(0..640) as f32,
        y: rng.random_range(0..480) as f32,
        z: 0.0,
        rotation: rng.random::<f32>() * TAU,
        w: SPRITE_SIZE,
        h: SPRITE_SIZE,
        padding_a: 0.0,
        padding_b: 0.0,
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    }
}

/// Thousands of rotated sprites: instances are randomized on the CPU every
/// update, expanded into quads by a compute pass and drawn with one indexed
/// call.
pub struct SpriteBatchComputeScene {
    input: InputState,
    rng: StdRng,
    sprites: Vec<ComputeSpriteInstance>,
    resources: Option<Resources>,
}

struct Resources {
    render_pipeline: Tracked<wgpu::RenderPipeline>,
    compute_pipeline: Tracked<wgpu::ComputePipeline>,
    _texture: Tracked<wgpu::Texture>,
    _sampler: Tracked<wgpu::Sampler>,
    instances: Tracked<wgpu::Buffer>,
    vertices: Tracked<wgpu::Buffer>,
    indices: Tracked<wgpu::Buffer>,
    _view_proj: Tracked<wgpu::Buffer>,
    /// Reused every frame; cycled once its previous contents were uploaded.
    instance_transfer: TransferBuffer,
    texture_group: wgpu::BindGroup,
    view_proj_group: wgpu::BindGroup,
    compute_group: wgpu::BindGroup,
}

impl SpriteBatchComputeScene {
    pub fn new() -> Self {
        Self {
            input: InputState::default(),
            rng: StdRng::seed_from_u64(RNG_SEED),
            sprites: Vec::with_capacity(SPRITE_COUNT as usize),
            resources: None,
        }
    }

    fn randomize_sprites(&mut self) {
        self.sprites.clear();
        for _ in 0..SPRITE_COUNT {
            let sprite = random_sprite(&mut self.rng);
            self.sprites.push(sprite);
        }
    }
}

impl Default for SpriteBatchComputeScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for SpriteBatchComputeScene {
    fn name(&self) -> &'static str {
        "sprite-batch-compute"
    }

    fn load(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        self.rng = StdRng::seed_from_u64(RNG_SEED);
        self.randomize_sprites();

        // Graphics pipeline
        let vertex = renderer.load_shader("TexturedQuadColorWithMatrix.vert")?;
        let fragment = renderer.load_shader("TexturedQuadColor.frag")?;

        let texture_layout = texture_sampler_layout(renderer, "sprite texture");
        let view_proj_layout = renderer.create_bind_group_layout(
            "sprite view projection",
            &[binding::uniform_buffer(
                0,
                wgpu::ShaderStages::VERTEX,
                byte_size(&[Mat4::IDENTITY]),
                false,
            )],
        );
        let layouts = [PositionTextureColorVertex::layout()];
        let bind_group_layouts = [&texture_layout, &view_proj_layout];
        let mut info = GraphicsPipelineInfo::new("sprite batch", &vertex, &fragment);
        info.vertex_buffers = &layouts;
        info.bind_group_layouts = &bind_group_layouts;
        let render_pipeline = renderer.create_graphics_pipeline(&info)?;
        renderer.release((vertex, fragment));

        // Compute pipeline
        let compute_layout = renderer.create_bind_group_layout(
            "sprite batch compute",
            &[binding::storage_buffer(0, true), binding::storage_buffer(1, false)],
        );
        let compute_pipeline = renderer.create_compute_pipeline_from_shader(&ComputePipelineInfo {
            shader: "SpriteBatch.comp",
            bind_group_layouts: &[&compute_layout],
        })?;

        // Texture
        let image = renderer.load_bmp_image("ravioli.bmp")?;
        let texture = create_image_texture(renderer, "ravioli", &image);
        let sampler = renderer.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite"),
            ..Default::default()
        });

        // Buffers
        let instances = renderer.create_buffer(
            "sprite instances",
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            INSTANCE_BYTES,
        );
        let vertices = renderer.create_buffer(
            "sprite vertices",
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::VERTEX,
            VERTEX_BYTES,
        );
        let index_data = sprite_indices(SPRITE_COUNT);
        let index_bytes = byte_size(&index_data);
        let indices = renderer.create_buffer(
            "sprite indices",
            wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            index_bytes,
        );
        let view_proj = renderer.create_buffer(
            "sprite view projection",
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            byte_size(&[Mat4::IDENTITY]),
        );
        renderer.write_buffer(&view_proj, 0, bytemuck::bytes_of(&view_projection()));

        // Upload texture and indices in one copy pass
        let mut staged = stage_image(renderer, &image)?;
        let mut index_transfer = renderer.create_transfer_buffer(index_bytes);
        renderer.map_transfer_buffer(&mut index_transfer, false, |data| {
            write_pod(data, 0, &index_data);
        })?;

        renderer.begin_upload()?;
        renderer.upload_to_texture(
            &mut staged.transfer,
            0,
            staged.bytes_per_row,
            &texture,
            staged.extent,
        )?;
        renderer.upload_to_buffer(&mut index_transfer, 0, &indices, 0, index_bytes)?;
        renderer.end_upload()?;
        renderer.release((staged, index_transfer));

        let instance_transfer = renderer.create_transfer_buffer(INSTANCE_BYTES);

        // Bind groups
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let texture_group =
            texture_sampler_group(renderer, "sprite texture", &texture_layout, &view, &sampler);
        let view_proj_group = renderer.create_bind_group(
            "sprite view projection",
            &view_proj_layout,
            &[wgpu::BindGroupEntry {
                binding: 0,
                resource: view_proj.as_entire_binding(),
            }],
        );
        let compute_group = renderer.create_bind_group(
            "sprite batch compute",
            &compute_layout,
            &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: instances.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: vertices.as_entire_binding(),
                },
            ],
        );

        self.resources = Some(Resources {
            render_pipeline,
            compute_pipeline,
            _texture: texture,
            _sampler: sampler,
            instances,
            vertices,
            indices,
            _view_proj: view_proj,
            instance_transfer,
            texture_group,
            view_proj_group,
            compute_group,
        });
        Ok(())
    }

    fn update(&mut self, _dt: f32, input: &InputFrame) -> AppControl {
        let control = self.input.manage(input);
        self.randomize_sprites();
        control
    }

    fn draw(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let Some(res) = self.resources.as_mut() else {
            return Ok(());
        };

        // Upload this frame's instances; the transfer buffer was consumed by
        // the previous frame, so it is cycled.
        let sprites = &self.sprites;
        renderer.map_transfer_buffer(&mut res.instance_transfer, true, |data| {
            write_pod(data, 0, sprites);
        })?;
        renderer.begin_upload()?;
        renderer.upload_to_buffer(&mut res.instance_transfer, 0, &res.instances, 0, INSTANCE_BYTES)?;
        renderer.end_upload()?;

        // Expand instances into vertices
        renderer.begin_compute()?;
        renderer.bind_compute_pipeline(&res.compute_pipeline);
        renderer.bind_compute_group(0, &res.compute_group, &[]);
        renderer.dispatch_compute(SPRITE_COUNT.div_ceil(THREADS), 1, 1);
        renderer.end_compute()?;

        // Passes cannot overlap: the render pass starts after the compute pass ended.
        renderer.begin(None)?;
        renderer.bind_graphics_pipeline(&res.render_pipeline);
        renderer.bind_vertex_buffer(0, &res.vertices);
        renderer.bind_index_buffer(&res.indices, wgpu::IndexFormat::Uint32);
        renderer.bind_group(0, &res.texture_group, &[]);
        renderer.bind_group(1, &res.view_proj_group, &[]);
        renderer.draw_indexed_primitives(SPRITE_COUNT * 6, 1, 0, 0, 0);
        renderer.end()
    }

    fn unload(&mut self, renderer: &mut Renderer<'_>) {
        renderer.release(self.resources.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn indices_form_two_triangles_per_sprite() {
        let indices = sprite_indices(2);
        assert_eq!(indices, vec![0, 1, 2, 3, 2, 1, 4, 5, 6, 7, 6, 5]);
        assert_eq!(sprite_indices(SPRITE_COUNT).len(), SPRITE_COUNT as usize * 6);
    }

    #[test]
    fn projection_maps_pixels_to_clip_space() {
        let proj = view_projection();
        let top_left = proj * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = proj * Vec4::new(640.0, 480.0, 0.0, 1.0);
        assert!((top_left - Vec4::new(-1.0, 1.0, 0.0, 1.0)).length() < 1e-5);
        assert!((bottom_right - Vec4::new(1.0, -1.0, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn sprites_are_regenerated_every_update() {
        let mut scene = SpriteBatchComputeScene::new();
        scene.update(0.016, &InputFrame::default());
        let first = scene.sprites.clone();
        scene.update(0.016, &InputFrame::default());

        assert_eq!(scene.sprites.len(), SPRITE_COUNT as usize);
        assert_ne!(first, scene.sprites);
    }

    #[test]
    fn random_sprites_stay_on_screen() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let sprite = random_sprite(&mut rng);
            assert!((0.0..640.0).contains(&sprite.x));
            assert!((0.0..480.0).contains(&sprite.y));
            assert!((0.0..TAU).contains(&sprite.rotation));
            assert_eq!((sprite.w, sprite.h), (SPRITE_SIZE, SPRITE_SIZE));
        }
    }

    #[test]
    fn seeded_scenes_produce_the_same_batch() {
        let mut a = SpriteBatchComputeScene::new();
        let mut b = SpriteBatchComputeScene::new();
        a.update(0.016, &InputFrame::default());
        b.update(0.016, &InputFrame::default());
        assert_eq!(a.sprites, b.sprites);
    }

    #[test]
    fn dispatch_covers_every_sprite() {
        assert_eq!(SPRITE_COUNT.div_ceil(THREADS) * THREADS, SPRITE_COUNT);
    }
}
