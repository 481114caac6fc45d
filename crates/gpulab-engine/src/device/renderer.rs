use std::borrow::Cow;

use anyhow::{bail, ensure, Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::content::{ContentPaths, Image};
use crate::resource::{LedgerSnapshot, ResourceKind, ResourceLedger, Tracked};

use super::error::{LifecycleError, TransferError};
use super::lifecycle::{FramePhase, Pass};
use super::pipeline::{
    ComputePipelineInfo, DepthStencilTarget, GraphicsPipelineInfo, ScissorRect, Viewport,
};
use super::shader::{Shader, ShaderFormat, ShaderStage};
use super::surface::{self, FrameTarget, Presenter};
use super::transfer::{aligned_transfer_size, TransferBuffer, TransferState};
use super::RendererInit;

/// Owns the GPU device bound to a window and records every command the
/// scenes issue.
///
/// The renderer follows a strict protocol: a frame is acquired, at most one
/// render, compute or copy pass is open at a time, and the frame is ended
/// before the next one starts. Copy and compute passes record into their own
/// encoder and are submitted when they end, so they may also run between
/// frames. Protocol violations are returned as `LifecycleError`.
///
/// Render and compute pass commands issued while the matching pass is not
/// open are ignored. This also covers frames whose swapchain texture could
/// not be acquired: the render pass is skipped and the frame submits nothing.
pub struct Renderer<'w> {
    presenter: Presenter<'w>,
    window: Option<&'w Window>,

    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    content: ContentPaths,
    ledger: ResourceLedger,

    phase: FramePhase,
    // Passes are declared before the frame so they drop before its encoder.
    render_pass: Option<wgpu::RenderPass<'static>>,
    frame: Option<Frame>,
    compute: Option<ComputeRecording>,
    copy: Option<CopyRecording>,
    copy_passes: u64,

    blitter: Option<wgpu::util::TextureBlitter>,
}

struct Frame {
    encoder: wgpu::CommandEncoder,
    /// `None` when the swapchain texture could not be acquired.
    target: Option<FrameTarget>,
}

struct ComputeRecording {
    // Declared before the encoder: the pass must be dropped first.
    pass: wgpu::ComputePass<'static>,
    encoder: wgpu::CommandEncoder,
}

struct CopyRecording {
    id: u64,
    encoder: wgpu::CommandEncoder,
}

impl<'w> Renderer<'w> {
    /// Creates a renderer presenting to `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: RendererInit) -> Result<Self> {
        let size = window.inner_size();
        ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = open_device(&adapter, &init).await?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = surface::choose_alpha_mode(&caps, init.alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        log::info!(
            "swapchain: {}x{} {:?} {:?}",
            size.width,
            size.height,
            format,
            init.present_mode
        );

        let presenter = Presenter::Surface {
            surface,
            config,
            size,
        };
        Ok(Self::assemble(presenter, Some(window), adapter, device, queue, init.content))
    }

    pub fn supports_features(&self, features: wgpu::Features) -> bool {
        self.device.features().contains(features)
    }

    pub fn texture_supports_format(
        &self,
        format: wgpu::TextureFormat,
        usages: wgpu::TextureUsages,
    ) -> bool {
        self.adapter
            .get_texture_format_features(format)
            .allowed_usages
            .contains(usages)
    }

    pub fn swapchain_format(&self) -> wgpu::TextureFormat {
        self.presenter.format()
    }

    /// Current drawable size (physical pixels).
    pub fn window_size_in_pixels(&self) -> (u32, u32) {
        self.presenter.size()
    }

    pub fn backend(&self) -> wgpu::Backend {
        self.adapter.get_info().backend
    }

    /// Required alignment of dynamic uniform buffer offsets.
    pub fn uniform_offset_alignment(&self) -> u32 {
        self.device.limits().min_uniform_buffer_offset_alignment
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Reconfigures the surface after a resize.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.presenter.resize(&self.device, new_size);
    }

    // ── frame ───────────────────────────────────────────────────────────────

    /// Acquires the swapchain texture and begins a render pass that clears
    /// color to opaque black (and the depth-stencil target when given).
    pub fn begin(&mut self, depth_stencil: Option<DepthStencilTarget<'_>>) -> Result<()> {
        self.acquire_frame()?;
        self.begin_render_pass(depth_stencil)
    }

    /// Starts a frame and acquires its color target.
    ///
    /// Returns `false` when the swapchain texture is unavailable this frame;
    /// the frame still has to be ended.
    pub fn acquire_frame(&mut self) -> Result<bool> {
        self.phase.begin_frame()?;

        let target = match self.presenter.acquire(&self.device) {
            Ok(target) => target,
            Err(action) => {
                self.phase.reset();
                bail!("swapchain texture acquisition failed ({action:?})");
            }
        };

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("gpulab frame encoder"),
            });

        let acquired = target.is_some();
        self.frame = Some(Frame { encoder, target });
        Ok(acquired)
    }

    pub fn begin_render_pass(&mut self, depth_stencil: Option<DepthStencilTarget<'_>>) -> Result<()> {
        self.phase.begin_pass(Pass::Render)?;

        let Frame { encoder, target } = self.frame.as_mut().ok_or(LifecycleError::NoFrame)?;
        let Some(target) = target.as_ref() else {
            return Ok(());
        };

        let depth_stencil_attachment =
            depth_stencil.map(|ds| wgpu::RenderPassDepthStencilAttachment {
                view: ds.view,
                depth_ops: ds.format.has_depth_aspect().then_some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ds.clear_depth),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: ds.format.has_stencil_aspect().then_some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ds.clear_stencil),
                    store: wgpu::StoreOp::Store,
                }),
            });

        let pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("gpulab render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        self.render_pass = Some(pass);
        Ok(())
    }

    pub fn end_render_pass(&mut self) -> Result<()> {
        self.phase.end_pass(Pass::Render)?;
        self.render_pass = None;
        Ok(())
    }

    /// Ends an open render pass, submits the frame and presents it.
    pub fn end(&mut self) -> Result<()> {
        if self.phase.open_pass() == Some(Pass::Render) {
            self.end_render_pass()?;
        }
        self.phase.end_frame()?;

        let frame = self.frame.take().ok_or(LifecycleError::NoFrame)?;
        self.queue.submit(std::iter::once(frame.encoder.finish()));

        if let Some(FrameTarget::Surface { texture, view }) = frame.target {
            drop(view);
            if let Some(window) = self.window {
                window.pre_present_notify();
            }
            texture.present();
        }
        Ok(())
    }

    /// Linear-filtered copy of `source` onto the whole swapchain texture.
    ///
    /// Must be called inside a frame with no pass open.
    pub fn blit_to_swapchain(&mut self, source: &wgpu::TextureView) -> Result<()> {
        self.phase.require_frame_outside_pass()?;

        let format = self.presenter.format();
        let blitter = self.blitter.get_or_insert_with(|| {
            wgpu::util::TextureBlitterBuilder::new(&self.device, format)
                .sample_type(wgpu::FilterMode::Linear)
                .build()
        });

        let frame = self.frame.as_mut().ok_or(LifecycleError::NoFrame)?;
        if let Some(target) = frame.target.as_ref() {
            blitter.copy(&self.device, &mut frame.encoder, source, target.view());
        }
        Ok(())
    }

    // ── render pass commands ──────────────────────────────────────────────

    pub fn bind_graphics_pipeline(&mut self, pipeline: &wgpu::RenderPipeline) {
        if let Some(pass) = self.render_pass.as_mut() {
            pass.set_pipeline(pipeline);
        }
    }

    pub fn bind_vertex_buffer(&mut self, slot: u32, buffer: &wgpu::Buffer) {
        if let Some(pass) = self.render_pass.as_mut() {
            pass.set_vertex_buffer(slot, buffer.slice(..));
        }
    }

    pub fn bind_index_buffer(&mut self, buffer: &wgpu::Buffer, format: wgpu::IndexFormat) {
        if let Some(pass) = self.render_pass.as_mut() {
            pass.set_index_buffer(buffer.slice(..), format);
        }
    }

    pub fn bind_group(&mut self, index: u32, group: &wgpu::BindGroup, dynamic_offsets: &[u32]) {
        if let Some(pass) = self.render_pass.as_mut() {
            pass.set_bind_group(index, group, dynamic_offsets);
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if let Some(pass) = self.render_pass.as_mut() {
            pass.set_viewport(
                viewport.x,
                viewport.y,
                viewport.w,
                viewport.h,
                viewport.min_depth,
                viewport.max_depth,
            );
        }
    }

    pub fn set_scissor(&mut self, rect: ScissorRect) {
        if let Some(pass) = self.render_pass.as_mut() {
            pass.set_scissor_rect(rect.x, rect.y, rect.w, rect.h);
        }
    }

    pub fn set_stencil_reference(&mut self, reference: u32) {
        if let Some(pass) = self.render_pass.as_mut() {
            pass.set_stencil_reference(reference);
        }
    }

    pub fn draw_primitives(
        &mut self,
        num_vertices: u32,
        num_instances: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        if let Some(pass) = self.render_pass.as_mut() {
            pass.draw(
                first_vertex..first_vertex + num_vertices,
                first_instance..first_instance + num_instances,
            );
        }
    }

    pub fn draw_indexed_primitives(
        &mut self,
        num_indices: u32,
        num_instances: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        if let Some(pass) = self.render_pass.as_mut() {
            pass.draw_indexed(
                first_index..first_index + num_indices,
                vertex_offset,
                first_instance..first_instance + num_instances,
            );
        }
    }

    // ── copy pass ───────────────────────────────────────────────────────────

    pub fn begin_upload(&mut self) -> Result<()> {
        self.phase.begin_pass(Pass::Copy)?;
        self.copy_passes += 1;

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("gpulab copy encoder"),
            });
        self.copy = Some(CopyRecording {
            id: self.copy_passes,
            encoder,
        });
        Ok(())
    }

    /// Copies `size` bytes from a written transfer buffer into `destination`.
    pub fn upload_to_buffer(
        &mut self,
        source: &mut TransferBuffer,
        source_offset: u64,
        destination: &wgpu::Buffer,
        destination_offset: u64,
        size: u64,
    ) -> Result<()> {
        self.phase.require_pass(Pass::Copy)?;
        source.check_range(source_offset, size)?;

        let copy = self.copy.as_mut().ok_or(LifecycleError::NoFrame)?;
        source.state = source.state.consume(copy.id)?;
        copy.encoder.copy_buffer_to_buffer(
            source.raw(),
            source_offset,
            destination,
            destination_offset,
            size,
        );
        Ok(())
    }

    /// Copies rows of texels from a transfer buffer into mip 0 of `destination`.
    ///
    /// `bytes_per_row` must be a multiple of `wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`.
    pub fn upload_to_texture(
        &mut self,
        source: &mut TransferBuffer,
        offset: u64,
        bytes_per_row: u32,
        destination: &wgpu::Texture,
        size: wgpu::Extent3d,
    ) -> Result<()> {
        self.phase.require_pass(Pass::Copy)?;
        let len = u64::from(bytes_per_row)
            * u64::from(size.height)
            * u64::from(size.depth_or_array_layers);
        source.check_range(offset, len)?;

        let copy = self.copy.as_mut().ok_or(LifecycleError::NoFrame)?;
        source.state = source.state.consume(copy.id)?;
        copy.encoder.copy_buffer_to_texture(
            wgpu::TexelCopyBufferInfo {
                buffer: source.raw(),
                layout: wgpu::TexelCopyBufferLayout {
                    offset,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(size.height),
                },
            },
            wgpu::TexelCopyTextureInfo {
                texture: destination,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            size,
        );
        Ok(())
    }

    /// Ends the copy pass and submits its commands.
    pub fn end_upload(&mut self) -> Result<()> {
        self.phase.end_pass(Pass::Copy)?;
        if let Some(copy) = self.copy.take() {
            self.queue.submit(std::iter::once(copy.encoder.finish()));
        }
        Ok(())
    }

    // ── compute pass ────────────────────────────────────────────────────────

    pub fn begin_compute(&mut self) -> Result<()> {
        self.phase.begin_pass(Pass::Compute)?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("gpulab compute encoder"),
            });
        let pass = encoder
            .begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("gpulab compute pass"),
                timestamp_writes: None,
            })
            .forget_lifetime();

        self.compute = Some(ComputeRecording { pass, encoder });
        Ok(())
    }

    pub fn bind_compute_pipeline(&mut self, pipeline: &wgpu::ComputePipeline) {
        if let Some(compute) = self.compute.as_mut() {
            compute.pass.set_pipeline(pipeline);
        }
    }

    pub fn bind_compute_group(
        &mut self,
        index: u32,
        group: &wgpu::BindGroup,
        dynamic_offsets: &[u32],
    ) {
        if let Some(compute) = self.compute.as_mut() {
            compute.pass.set_bind_group(index, group, dynamic_offsets);
        }
    }

    pub fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        if let Some(compute) = self.compute.as_mut() {
            compute.pass.dispatch_workgroups(x, y, z);
        }
    }

    /// Ends the compute pass and submits its commands.
    pub fn end_compute(&mut self) -> Result<()> {
        self.phase.end_pass(Pass::Compute)?;
        if let Some(ComputeRecording { pass, encoder }) = self.compute.take() {
            drop(pass);
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        Ok(())
    }

    // ── resources ───────────────────────────────────────────────────────────

    fn track<T>(&self, inner: T, kind: ResourceKind) -> Tracked<T> {
        Tracked::new(inner, kind, &self.ledger)
    }

    /// Loads `Content/Shaders/<name>` in the format the backend prefers.
    ///
    /// The stage comes from the name (`.vert`, `.frag`, `.comp`).
    pub fn load_shader(&self, name: &str) -> Result<Tracked<Shader>> {
        let stage = ShaderStage::from_name(name)
            .with_context(|| format!("cannot infer shader stage from {name:?}"))?;
        let backend = self.backend();

        for &format in ShaderFormat::preferred(backend) {
            let path = match format {
                ShaderFormat::SpirV => self.content.compiled_spirv(name),
                ShaderFormat::Wgsl => self.content.shader(&format!("{name}.wgsl")),
            };
            let Some(path) = path else {
                continue;
            };

            let module = match format {
                ShaderFormat::Wgsl => {
                    let source = std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(name),
                        source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
                    })
                }
                ShaderFormat::SpirV => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(name),
                        source: wgpu::util::make_spirv(&bytes),
                    })
                }
            };

            log::debug!("loaded {stage} shader {name} ({format:?}) from {}", path.display());
            return Ok(self.track(Shader::new(module, name, stage, format), ResourceKind::Shader));
        }

        bail!(
            "shader {name} not found for {backend:?} (content roots: {:?})",
            self.content.roots()
        )
    }

    pub fn create_graphics_pipeline(
        &self,
        info: &GraphicsPipelineInfo<'_>,
    ) -> Result<Tracked<wgpu::RenderPipeline>> {
        ensure!(
            info.vertex_shader.stage() == ShaderStage::Vertex,
            "{}: {} is not a vertex shader",
            info.label,
            info.vertex_shader.name()
        );
        ensure!(
            info.fragment_shader.stage() == ShaderStage::Fragment,
            "{}: {} is not a fragment shader",
            info.label,
            info.fragment_shader.name()
        );
        if info.primitive.polygon_mode == wgpu::PolygonMode::Line {
            ensure!(
                self.supports_features(wgpu::Features::POLYGON_MODE_LINE),
                "{}: line polygon mode is not supported by this device",
                info.label
            );
        }

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(info.label),
                bind_group_layouts: info.bind_group_layouts,
                immediate_size: 0,
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(info.label),
                layout: Some(&layout),

                vertex: wgpu::VertexState {
                    module: info.vertex_shader.module(),
                    entry_point: Some(info.vertex_shader.entry_point()),
                    compilation_options: Default::default(),
                    buffers: info.vertex_buffers,
                },

                fragment: Some(wgpu::FragmentState {
                    module: info.fragment_shader.module(),
                    entry_point: Some(info.fragment_shader.entry_point()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: info.color_format.unwrap_or_else(|| self.swapchain_format()),
                        blend: info.blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: info.primitive,
                depth_stencil: info.depth_stencil.clone(),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        Ok(self.track(pipeline, ResourceKind::GraphicsPipeline))
    }

    /// Loads a `.comp` shader and builds a compute pipeline from it.
    ///
    /// The shader module is released once the pipeline exists.
    pub fn create_compute_pipeline_from_shader(
        &self,
        info: &ComputePipelineInfo<'_>,
    ) -> Result<Tracked<wgpu::ComputePipeline>> {
        let shader = self.load_shader(info.shader)?;
        ensure!(
            shader.stage() == ShaderStage::Compute,
            "{} is not a compute shader",
            info.shader
        );

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(info.shader),
                bind_group_layouts: info.bind_group_layouts,
                immediate_size: 0,
            });

        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(info.shader),
                layout: Some(&layout),
                module: shader.module(),
                entry_point: Some(shader.entry_point()),
                compilation_options: Default::default(),
                cache: None,
            });

        Ok(self.track(pipeline, ResourceKind::ComputePipeline))
    }

    pub fn create_buffer(
        &self,
        label: &str,
        usage: wgpu::BufferUsages,
        size: u64,
    ) -> Tracked<wgpu::Buffer> {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        });
        self.track(buffer, ResourceKind::Buffer)
    }

    pub fn create_texture(&self, desc: &wgpu::TextureDescriptor<'_>) -> Tracked<wgpu::Texture> {
        self.track(self.device.create_texture(desc), ResourceKind::Texture)
    }

    pub fn create_sampler(&self, desc: &wgpu::SamplerDescriptor<'_>) -> Tracked<wgpu::Sampler> {
        self.track(self.device.create_sampler(desc), ResourceKind::Sampler)
    }

    fn staging_buffer(&self, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gpulab transfer buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Creates a transfer buffer of at least `size` bytes.
    pub fn create_transfer_buffer(&self, size: u64) -> TransferBuffer {
        let size = aligned_transfer_size(size);
        let buffer = self.track(self.staging_buffer(size), ResourceKind::TransferBuffer);
        TransferBuffer::new(buffer, size as usize)
    }

    /// Maps `buffer`, hands its bytes to `write`, then unmaps it.
    ///
    /// A buffer already consumed by an upload can only be mapped again with
    /// `cycle = true`, which swaps in fresh backing storage.
    pub fn map_transfer_buffer<R>(
        &self,
        buffer: &mut TransferBuffer,
        cycle: bool,
        write: impl FnOnce(&mut [u8]) -> R,
    ) -> Result<R, TransferError> {
        if buffer.state.begin_map(cycle)? {
            let fresh = self.staging_buffer(buffer.size());
            buffer.buffer.replace(fresh);
        }

        let out = write(&mut buffer.data);
        self.queue.write_buffer(buffer.raw(), 0, &buffer.data);
        buffer.state = TransferState::Written;
        Ok(out)
    }

    pub fn create_bind_group_layout(
        &self,
        label: &str,
        entries: &[wgpu::BindGroupLayoutEntry],
    ) -> wgpu::BindGroupLayout {
        self.device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries,
            })
    }

    pub fn create_bind_group(
        &self,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        entries: &[wgpu::BindGroupEntry<'_>],
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries,
        })
    }

    /// Queues `data` into a buffer; applied before the next submission.
    pub fn write_buffer(&self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }

    /// Loads `Content/Images/<name>` as RGBA8.
    pub fn load_bmp_image(&self, name: &str) -> Result<Image> {
        let path = self.content.image(name)?;
        Image::load_bmp(&path)
    }

    /// Drops scene resources and logs what is still alive.
    pub fn release<R>(&self, resources: R) {
        drop(resources);
        log::debug!("released scene resources; live: {}", self.ledger.snapshot());
    }

    /// Abandons any open frame or pass and reports leaked resources.
    pub fn close(&mut self) -> LedgerSnapshot {
        if !self.phase.is_idle() {
            log::warn!("closing renderer with an open frame or pass: {:?}", self.phase);
        }
        self.render_pass = None;
        self.compute = None;
        self.copy = None;
        self.frame = None;
        self.phase.reset();

        let snapshot = self.ledger.snapshot();
        for (kind, live) in snapshot.leaks() {
            log::warn!("{live} {kind} handle(s) still alive at shutdown");
        }
        snapshot
    }
}

impl Renderer<'static> {
    /// Creates a renderer drawing into an offscreen `width`x`height` target.
    ///
    /// Used where no window exists; returns an error when no adapter is
    /// available.
    pub async fn headless(width: u32, height: u32, init: RendererInit) -> Result<Self> {
        ensure!(width > 0 && height > 0, "offscreen target has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = open_device(&adapter, &init).await?;

        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("gpulab offscreen target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let presenter = Presenter::Offscreen { texture, format };
        Ok(Self::assemble(presenter, None, adapter, device, queue, init.content))
    }
}

impl<'w> Renderer<'w> {
    fn assemble(
        presenter: Presenter<'w>,
        window: Option<&'w Window>,
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        content: ContentPaths,
    ) -> Self {
        Self {
            presenter,
            window,
            adapter,
            device,
            queue,
            content,
            ledger: ResourceLedger::new(),
            phase: FramePhase::default(),
            render_pass: None,
            frame: None,
            compute: None,
            copy: None,
            copy_passes: 0,
            blitter: None,
        }
    }
}

async fn open_device(
    adapter: &wgpu::Adapter,
    init: &RendererInit,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    let info = adapter.get_info();
    log::info!("adapter: {} ({:?})", info.name, info.backend);

    let required_features = init.optional_features & adapter.features();
    let missing = init.optional_features - required_features;
    if !missing.is_empty() {
        log::info!("optional features unavailable: {missing:?}");
    }

    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("gpulab device"),
            required_features,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn headless_with(content: ContentPaths) -> Option<Renderer<'static>> {
        let init = RendererInit {
            content,
            ..Default::default()
        };
        match pollster::block_on(Renderer::headless(64, 64, init)) {
            Ok(renderer) => Some(renderer),
            Err(err) => {
                eprintln!("skipping renderer test: {err:#}");
                None
            }
        }
    }

    fn headless() -> Option<Renderer<'static>> {
        headless_with(ContentPaths::default())
    }

    fn lifecycle_error(err: &anyhow::Error) -> Option<LifecycleError> {
        err.downcast_ref::<LifecycleError>().copied()
    }

    fn transfer_error(err: &anyhow::Error) -> Option<TransferError> {
        err.downcast_ref::<TransferError>().copied()
    }

    fn small_texture(renderer: &Renderer<'_>, usage: wgpu::TextureUsages) -> Tracked<wgpu::Texture> {
        renderer.create_texture(&wgpu::TextureDescriptor {
            label: Some("test texture"),
            size: wgpu::Extent3d {
                width: 4,
                height: 4,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage,
            view_formats: &[],
        })
    }

    #[test]
    fn frame_without_target_skips_the_pass_but_still_ends() {
        let Some(mut renderer) = headless() else {
            return;
        };

        // No frame: commands are ignored.
        renderer.draw_primitives(3, 1, 0, 0);

        assert!(renderer.acquire_frame().unwrap());
        if let Some(frame) = renderer.frame.as_mut() {
            frame.target = None;
        }

        renderer.begin_render_pass(None).unwrap();
        assert!(renderer.render_pass.is_none());
        assert_eq!(renderer.phase.open_pass(), Some(Pass::Render));
        renderer.set_viewport(Viewport {
            x: 0.0,
            y: 0.0,
            w: 32.0,
            h: 32.0,
            min_depth: 0.0,
            max_depth: 1.0,
        });
        renderer.draw_primitives(3, 1, 0, 0);

        renderer.end().unwrap();
        assert!(renderer.phase.is_idle());
        assert!(renderer.frame.is_none());
    }

    #[test]
    fn blit_without_target_is_skipped() {
        let Some(mut renderer) = headless() else {
            return;
        };
        let texture = small_texture(&renderer, wgpu::TextureUsages::TEXTURE_BINDING);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        renderer.acquire_frame().unwrap();
        if let Some(frame) = renderer.frame.as_mut() {
            frame.target = None;
        }
        renderer.blit_to_swapchain(&view).unwrap();
        renderer.end().unwrap();
        assert!(renderer.phase.is_idle());
    }

    #[test]
    fn blit_requires_a_frame_without_open_pass() {
        let Some(mut renderer) = headless() else {
            return;
        };
        let texture = small_texture(&renderer, wgpu::TextureUsages::TEXTURE_BINDING);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let err = renderer.blit_to_swapchain(&view).unwrap_err();
        assert_eq!(lifecycle_error(&err), Some(LifecycleError::NoFrame));

        renderer.begin(None).unwrap();
        let err = renderer.blit_to_swapchain(&view).unwrap_err();
        assert_eq!(lifecycle_error(&err), Some(LifecycleError::PassOpen(Pass::Render)));
        renderer.end().unwrap();
    }

    #[test]
    fn second_begin_is_rejected() {
        let Some(mut renderer) = headless() else {
            return;
        };

        renderer.begin(None).unwrap();
        let err = renderer.begin(None).unwrap_err();
        assert_eq!(lifecycle_error(&err), Some(LifecycleError::FrameAlreadyBegun));

        // The first frame is still intact.
        renderer.end().unwrap();
        assert!(renderer.phase.is_idle());

        let err = renderer.end().unwrap_err();
        assert_eq!(lifecycle_error(&err), Some(LifecycleError::NoFrame));
    }

    #[test]
    fn passes_cannot_overlap_a_render_pass() {
        let Some(mut renderer) = headless() else {
            return;
        };

        renderer.begin(None).unwrap();
        let err = renderer.begin_upload().unwrap_err();
        assert_eq!(
            lifecycle_error(&err),
            Some(LifecycleError::PassAlreadyOpen {
                requested: Pass::Copy,
                open: Pass::Render,
            })
        );
        let err = renderer.begin_compute().unwrap_err();
        assert_eq!(
            lifecycle_error(&err),
            Some(LifecycleError::PassAlreadyOpen {
                requested: Pass::Compute,
                open: Pass::Render,
            })
        );
        renderer.end().unwrap();

        // Outside a frame a render pass has nothing to draw into.
        let err = renderer.begin_render_pass(None).unwrap_err();
        assert_eq!(lifecycle_error(&err), Some(LifecycleError::NoFrame));
    }

    #[test]
    fn copy_and_compute_passes_run_between_frames() {
        let Some(mut renderer) = headless() else {
            return;
        };

        renderer.begin_upload().unwrap();
        renderer.end_upload().unwrap();
        renderer.begin_compute().unwrap();
        renderer.end_compute().unwrap();
        assert!(renderer.phase.is_idle());

        let err = renderer.end_compute().unwrap_err();
        assert_eq!(
            lifecycle_error(&err),
            Some(LifecycleError::PassNotOpen {
                requested: Pass::Compute,
                open: None,
            })
        );
    }

    #[test]
    fn consumed_transfer_buffer_needs_cycle_to_remap() {
        let Some(mut renderer) = headless() else {
            return;
        };
        let mut transfer = renderer.create_transfer_buffer(16);
        let destination = renderer.create_buffer("dst", wgpu::BufferUsages::COPY_DST, 16);

        renderer
            .map_transfer_buffer(&mut transfer, false, |bytes| bytes.fill(7))
            .unwrap();
        assert_eq!(transfer.state, TransferState::Written);

        renderer.begin_upload().unwrap();
        renderer
            .upload_to_buffer(&mut transfer, 0, &destination, 0, 16)
            .unwrap();
        renderer.end_upload().unwrap();
        assert!(matches!(transfer.state, TransferState::Consumed { .. }));

        assert_eq!(
            renderer.map_transfer_buffer(&mut transfer, false, |_| ()),
            Err(TransferError::NotCycled)
        );

        let created = renderer.ledger().snapshot().created(ResourceKind::TransferBuffer);
        let size = transfer.size();
        renderer
            .map_transfer_buffer(&mut transfer, true, |bytes| bytes.fill(9))
            .unwrap();

        let snapshot = renderer.ledger().snapshot();
        assert_eq!(snapshot.created(ResourceKind::TransferBuffer), created + 1);
        assert_eq!(snapshot.live(ResourceKind::TransferBuffer), 1);
        assert_eq!(transfer.size(), size);
        assert_eq!(transfer.state, TransferState::Written);
        assert!(transfer.data.iter().all(|&b| b == 9));

        // Freshly written again: the next upload goes through.
        renderer.begin_upload().unwrap();
        renderer
            .upload_to_buffer(&mut transfer, 0, &destination, 0, 16)
            .unwrap();
        renderer.end_upload().unwrap();
    }

    #[test]
    fn rewriting_before_upload_keeps_the_staging_buffer() {
        let Some(renderer) = headless() else {
            return;
        };
        let mut transfer = renderer.create_transfer_buffer(8);
        renderer.map_transfer_buffer(&mut transfer, false, |_| ()).unwrap();
        renderer.map_transfer_buffer(&mut transfer, true, |_| ()).unwrap();
        assert_eq!(
            renderer.ledger().snapshot().created(ResourceKind::TransferBuffer),
            1
        );
    }

    #[test]
    fn uploads_reject_unwritten_or_out_of_range_sources() {
        let Some(mut renderer) = headless() else {
            return;
        };
        let mut transfer = renderer.create_transfer_buffer(16);
        let destination = renderer.create_buffer("dst", wgpu::BufferUsages::COPY_DST, 16);
        let texture = small_texture(&renderer, wgpu::TextureUsages::COPY_DST);

        let err = renderer
            .upload_to_buffer(&mut transfer, 0, &destination, 0, 16)
            .unwrap_err();
        assert_eq!(
            lifecycle_error(&err),
            Some(LifecycleError::PassNotOpen {
                requested: Pass::Copy,
                open: None,
            })
        );

        renderer.begin_upload().unwrap();
        let err = renderer
            .upload_to_buffer(&mut transfer, 0, &destination, 0, 16)
            .unwrap_err();
        assert_eq!(transfer_error(&err), Some(TransferError::NotWritten));
        renderer.end_upload().unwrap();

        renderer.map_transfer_buffer(&mut transfer, false, |_| ()).unwrap();
        renderer.begin_upload().unwrap();
        let err = renderer
            .upload_to_buffer(&mut transfer, 8, &destination, 0, 16)
            .unwrap_err();
        assert_eq!(
            transfer_error(&err),
            Some(TransferError::OutOfBounds {
                offset: 8,
                len: 16,
                size: 16,
            })
        );

        let extent = wgpu::Extent3d {
            width: 4,
            height: 4,
            depth_or_array_layers: 1,
        };
        let err = renderer
            .upload_to_texture(&mut transfer, 0, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, &texture, extent)
            .unwrap_err();
        assert_eq!(
            transfer_error(&err),
            Some(TransferError::OutOfBounds {
                offset: 0,
                len: u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * 4,
                size: 16,
            })
        );
        renderer.end_upload().unwrap();

        // Rejected uploads leave the buffer unconsumed.
        assert_eq!(transfer.state, TransferState::Written);
    }

    fn content_root_with_shader(tag: &str, file_name: &str, source: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "gpulab-renderer-{tag}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);
        let shaders = root.join("Content/Shaders");
        std::fs::create_dir_all(&shaders).unwrap();
        std::fs::write(shaders.join(file_name), source).unwrap();
        root
    }

    #[test]
    fn shader_without_compiled_binary_falls_back_to_wgsl() {
        let root = content_root_with_shader(
            "wgsl-fallback",
            "Noop.comp.wgsl",
            "@compute @workgroup_size(1)\nfn cs_main() {}\n",
        );
        let Some(renderer) = headless_with(ContentPaths::new([root.clone()])) else {
            let _ = std::fs::remove_dir_all(root);
            return;
        };

        let shader = renderer.load_shader("Noop.comp").unwrap();
        assert_eq!(shader.stage(), ShaderStage::Compute);
        assert_eq!(shader.format(), ShaderFormat::Wgsl);
        assert_eq!(shader.entry_point(), "cs_main");
        assert_eq!(renderer.ledger().live(ResourceKind::Shader), 1);
        drop(shader);
        assert_eq!(renderer.ledger().live(ResourceKind::Shader), 0);

        let err = renderer.load_shader("Missing.comp").unwrap_err();
        assert!(err.to_string().contains("Missing.comp"), "{err}");

        let err = renderer.load_shader("Noop").unwrap_err();
        assert!(err.to_string().contains("cannot infer shader stage"), "{err}");

        let _ = std::fs::remove_dir_all(root);
    }
}
