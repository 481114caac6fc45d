use anyhow::Result;

use gpulab_engine::core::{AppControl, Scene};
use gpulab_engine::device::{binding, ComputePipelineInfo, Renderer};
use gpulab_engine::input::{InputFrame, InputState};
use gpulab_engine::resource::Tracked;

use super::basic_compute::{create_screen_texture, workgroups_for};

/// Time added to the gradient uniform on every update.
const TIME_STEP: f32 = 0.01;

/// Uniform block of the gradient shader, padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct GradientUniforms {
    time: f32,
    _padding: [f32; 3],
}

const UNIFORM_SIZE: u64 = std::mem::size_of::<GradientUniforms>() as u64;

/// Recomputes an animated gradient texture every frame and blits it to the
/// swapchain.
#[derive(Default)]
pub struct UniformsComputeScene {
    input: InputState,
    uniforms: GradientUniforms,
    resources: Option<Resources>,
}

struct Resources {
    pipeline: Tracked<wgpu::ComputePipeline>,
    screen: Tracked<wgpu::Texture>,
    screen_view: wgpu::TextureView,
    uniform_buffer: Tracked<wgpu::Buffer>,
    group: wgpu::BindGroup,
}

impl UniformsComputeScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time(&self) -> f32 {
        self.uniforms.time
    }
}

impl Scene for UniformsComputeScene {
    fn name(&self) -> &'static str {
        "uniforms-compute"
    }

    fn load(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        self.uniforms = GradientUniforms::default();

        let layout = renderer.create_bind_group_layout(
            "gradient texture",
            &[
                binding::storage_texture(0, wgpu::TextureFormat::Rgba8Unorm),
                binding::uniform_buffer(1, wgpu::ShaderStages::COMPUTE, UNIFORM_SIZE, false),
            ],
        );
        let pipeline = renderer.create_compute_pipeline_from_shader(&ComputePipelineInfo {
            shader: "GradientTexture.comp",
            bind_group_layouts: &[&layout],
        })?;

        let screen = create_screen_texture(renderer, "gradient screen");
        let screen_view = screen.create_view(&wgpu::TextureViewDescriptor::default());
        let uniform_buffer = renderer.create_buffer(
            "gradient uniforms",
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            UNIFORM_SIZE,
        );

        let group = renderer.create_bind_group(
            "gradient texture",
            &layout,
            &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&screen_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        );

        self.resources = Some(Resources {
            pipeline,
            screen,
            screen_view,
            uniform_buffer,
            group,
        });
        Ok(())
    }

    fn update(&mut self, _dt: f32, input: &InputFrame) -> AppControl {
        self.uniforms.time += TIME_STEP;
        self.input.manage(input)
    }

    fn draw(&mut self, renderer: &mut Renderer<'_>) -> Result<()> {
        let Some(res) = self.resources.as_ref() else {
            return Ok(());
        };

        renderer.acquire_frame()?;

        renderer.write_buffer(&res.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
        let size = res.screen.size();
        let (x, y) = workgroups_for(size.width, size.height);

        renderer.begin_compute()?;
        renderer.bind_compute_pipeline(&res.pipeline);
        renderer.bind_compute_group(0, &res.group, &[]);
        renderer.dispatch_compute(x, y, 1);
        renderer.end_compute()?;

        renderer.blit_to_swapchain(&res.screen_view)?;
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
    fn time_advances_a_fixed_step_per_update() {
        let mut scene = UniformsComputeScene::new();
        for _ in 0..10 {
            scene.update(1.0, &InputFrame::default());
        }
        assert!((scene.time() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn uniform_block_is_sixteen_bytes() {
        assert_eq!(UNIFORM_SIZE, 16);
        let u = GradientUniforms {
            time: 2.0,
            ..Default::default()
        };
        assert_eq!(&bytemuck::bytes_of(&u)[..4], &2.0f32.to_ne_bytes());
    }
}
