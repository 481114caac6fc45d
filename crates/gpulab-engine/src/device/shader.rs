use std::fmt;

/// Pipeline stage a shader file is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderStage {
    /// Detects the stage from a shader name such as `RawTriangle.vert`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.contains(".vert") {
            Some(ShaderStage::Vertex)
        } else if name.contains(".frag") {
            Some(ShaderStage::Fragment)
        } else if name.contains(".comp") {
            Some(ShaderStage::Compute)
        } else {
            None
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
        })
    }
}

/// Source format of a shader on disk.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderFormat {
    /// `Content/Shaders/<name>.wgsl`
    Wgsl,
    /// `Content/Shaders/Compiled/SPIRV/<name>.spv`
    SpirV,
}

impl ShaderFormat {
    /// Formats to try for `backend`, most preferred first.
    pub fn preferred(backend: wgpu::Backend) -> &'static [ShaderFormat] {
        match backend {
            wgpu::Backend::Vulkan => &[ShaderFormat::SpirV, ShaderFormat::Wgsl],
            _ => &[ShaderFormat::Wgsl],
        }
    }

    /// Entry point name for `stage` in this format.
    ///
    /// WGSL files hold one stage each with a stage-named entry point;
    /// compiled SPIR-V uses `main`.
    pub fn entry_point(self, stage: ShaderStage) -> &'static str {
        match (self, stage) {
            (ShaderFormat::SpirV, _) => "main",
            (ShaderFormat::Wgsl, ShaderStage::Vertex) => "vs_main",
            (ShaderFormat::Wgsl, ShaderStage::Fragment) => "fs_main",
            (ShaderFormat::Wgsl, ShaderStage::Compute) => "cs_main",
        }
    }
}

/// A loaded shader module with its stage and entry point.
#[derive(Debug)]
pub struct Shader {
    pub(crate) module: wgpu::ShaderModule,
    name: String,
    stage: ShaderStage,
    format: ShaderFormat,
}

impl Shader {
    pub(crate) fn new(
        module: wgpu::ShaderModule,
        name: &str,
        stage: ShaderStage,
        format: ShaderFormat,
    ) -> Self {
        Self {
            module,
            name: name.to_string(),
            stage,
            format,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn format(&self) -> ShaderFormat {
        self.format
    }

    pub fn entry_point(&self) -> &'static str {
        self.format.entry_point(self.stage)
    }

    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_comes_from_the_name() {
        assert_eq!(ShaderStage::from_name("RawTriangle.vert"), Some(ShaderStage::Vertex));
        assert_eq!(ShaderStage::from_name("SolidColor.frag"), Some(ShaderStage::Fragment));
        assert_eq!(ShaderStage::from_name("FillTexture.comp"), Some(ShaderStage::Compute));
        assert_eq!(ShaderStage::from_name("Readme.txt"), None);
    }

    #[test]
    fn vulkan_prefers_spirv_then_wgsl() {
        assert_eq!(
            ShaderFormat::preferred(wgpu::Backend::Vulkan),
            &[ShaderFormat::SpirV, ShaderFormat::Wgsl]
        );
        assert_eq!(ShaderFormat::preferred(wgpu::Backend::Metal), &[ShaderFormat::Wgsl]);
        assert_eq!(ShaderFormat::preferred(wgpu::Backend::Dx12), &[ShaderFormat::Wgsl]);
    }

    #[test]
    fn entry_points_per_format() {
        assert_eq!(ShaderFormat::Wgsl.entry_point(ShaderStage::Vertex), "vs_main");
        assert_eq!(ShaderFormat::Wgsl.entry_point(ShaderStage::Fragment), "fs_main");
        assert_eq!(ShaderFormat::Wgsl.entry_point(ShaderStage::Compute), "cs_main");
        assert_eq!(ShaderFormat::SpirV.entry_point(ShaderStage::Fragment), "main");
    }
}
