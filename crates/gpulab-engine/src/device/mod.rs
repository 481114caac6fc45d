//! GPU device, swapchain and command recording.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain), or an offscreen target
//! - the frame/pass protocol scenes record their commands through
//! - creating ledger-tracked GPU resources

pub mod binding;
mod error;
mod init;
mod lifecycle;
mod pipeline;
mod renderer;
mod shader;
mod surface;
mod transfer;

pub use error::{LifecycleError, SurfaceErrorAction, TransferError};
pub use init::RendererInit;
pub use lifecycle::{FramePhase, Pass};
pub use pipeline::{
    alpha_blend, ComputePipelineInfo, DepthStencilTarget, GraphicsPipelineInfo, ScissorRect,
    Viewport,
};
pub use renderer::Renderer;
pub use shader::{Shader, ShaderFormat, ShaderStage};
pub use transfer::{TransferBuffer, TransferState};
