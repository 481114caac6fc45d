use crate::content::ContentPaths;

/// Initialization parameters for the renderer.
#[derive(Debug, Clone)]
pub struct RendererInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO is broadly supported; the frame clock does the pacing on top.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Features requested only when the adapter supports them.
    ///
    /// Scenes query `Renderer::supports_features` before relying on one.
    pub optional_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,

    /// Where shaders and images are looked up.
    pub content: ContentPaths,
}

impl Default for RendererInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            optional_features: wgpu::Features::POLYGON_MODE_LINE
                | wgpu::Features::DEPTH32FLOAT_STENCIL8,
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            content: ContentPaths::from_exe_dir(),
        }
    }
}
