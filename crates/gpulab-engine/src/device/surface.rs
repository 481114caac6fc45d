use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Where rendered frames go.
pub(crate) enum Presenter<'w> {
    /// Window swapchain.
    Surface {
        surface: wgpu::Surface<'w>,
        config: wgpu::SurfaceConfiguration,
        size: PhysicalSize<u32>,
    },
    /// Offscreen color target, used when no window exists.
    Offscreen {
        texture: wgpu::Texture,
        format: wgpu::TextureFormat,
    },
}

/// Color target acquired for the current frame.
pub(crate) enum FrameTarget {
    Surface {
        texture: wgpu::SurfaceTexture,
        view: wgpu::TextureView,
    },
    Offscreen {
        view: wgpu::TextureView,
    },
}

impl FrameTarget {
    pub(crate) fn view(&self) -> &wgpu::TextureView {
        match self {
            FrameTarget::Surface { view, .. } | FrameTarget::Offscreen { view } => view,
        }
    }
}

impl Presenter<'_> {
    pub(crate) fn format(&self) -> wgpu::TextureFormat {
        match self {
            Presenter::Surface { config, .. } => config.format,
            Presenter::Offscreen { format, .. } => *format,
        }
    }

    pub(crate) fn size(&self) -> (u32, u32) {
        match self {
            Presenter::Surface { size, .. } => (size.width, size.height),
            Presenter::Offscreen { texture, .. } => (texture.width(), texture.height()),
        }
    }

    /// Acquires the next color target.
    ///
    /// `Ok(None)` means the frame should be skipped.
    pub(crate) fn acquire(
        &mut self,
        device: &wgpu::Device,
    ) -> Result<Option<FrameTarget>, SurfaceErrorAction> {
        match self {
            Presenter::Surface {
                surface,
                config,
                size,
            } => {
                if size.width == 0 || size.height == 0 {
                    return Ok(None);
                }
                match surface.get_current_texture() {
                    Ok(texture) => {
                        let view = texture
                            .texture
                            .create_view(&wgpu::TextureViewDescriptor::default());
                        Ok(Some(FrameTarget::Surface { texture, view }))
                    }
                    Err(err) => {
                        log::warn!("failed to acquire swapchain texture: {err}");
                        match map_surface_error(surface, device, config, *size, err) {
                            SurfaceErrorAction::Fatal => Err(SurfaceErrorAction::Fatal),
                            _ => Ok(None),
                        }
                    }
                }
            }
            Presenter::Offscreen { texture, .. } => Ok(Some(FrameTarget::Offscreen {
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            })),
        }
    }

    /// Reconfigures the surface after a resize.
    ///
    /// wgpu does not support configuring a surface with a 0x0 size; in that case,
    /// only internal state is updated and configuration is deferred.
    pub(crate) fn resize(&mut self, device: &wgpu::Device, new_size: PhysicalSize<u32>) {
        let Presenter::Surface {
            surface,
            config,
            size,
        } = self
        else {
            return;
        };

        *size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        config.width = new_size.width;
        config.height = new_size.height;
        surface.configure(device, config);
    }
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}
