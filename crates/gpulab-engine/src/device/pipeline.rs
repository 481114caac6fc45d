use super::shader::Shader;

/// Everything needed to build a render pipeline besides the device.
///
/// Start from `GraphicsPipelineInfo::new` and assign the fields that differ
/// from its defaults.
#[derive(Debug, Clone)]
pub struct GraphicsPipelineInfo<'a> {
    pub label: &'a str,
    pub vertex_shader: &'a Shader,
    pub fragment_shader: &'a Shader,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub primitive: wgpu::PrimitiveState,
    pub depth_stencil: Option<wgpu::DepthStencilState>,
    pub blend: Option<wgpu::BlendState>,
    /// Color target format; the swapchain format when `None`.
    pub color_format: Option<wgpu::TextureFormat>,
}

impl<'a> GraphicsPipelineInfo<'a> {
    /// Triangle list, no culling, no vertex buffers, no blending.
    pub fn new(label: &'a str, vertex_shader: &'a Shader, fragment_shader: &'a Shader) -> Self {
        Self {
            label,
            vertex_shader,
            fragment_shader,
            vertex_buffers: &[],
            bind_group_layouts: &[],
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            blend: None,
            color_format: None,
        }
    }
}

/// Compute pipeline built straight from a `.comp` shader name.
#[derive(Debug, Clone, Copy)]
pub struct ComputePipelineInfo<'a> {
    pub shader: &'a str,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
}

/// Render pass depth-stencil attachment, cleared when the pass begins.
#[derive(Debug, Clone, Copy)]
pub struct DepthStencilTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Standard non-premultiplied alpha blending.
pub fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}
