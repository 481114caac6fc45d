//! The gpulab demo scenes.
//!
//! Each scene exercises one GPU feature through the engine's `Renderer`.
//! `SceneId` is the registry the command line picks from.

use std::fmt;
use std::str::FromStr;

use gpulab_engine::core::Scene;

pub mod common;
pub mod scenes;
pub mod vertex;

use scenes::*;

/// Directory holding this crate's `Content/` folder (shaders and images).
pub const CONTENT_ROOT: &str = env!("CARGO_MANIFEST_DIR");

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SceneId {
    Clear,
    Triangle,
    TriangleVertexBuffer,
    CullModes,
    TriangleStencil,
    TriangleInstances,
    TextureQuad,
    TextureQuadMoving,
    BasicCompute,
    UniformsCompute,
    SpriteBatchCompute,
}

impl SceneId {
    pub const ALL: [SceneId; 11] = [
        SceneId::Clear,
        SceneId::Triangle,
        SceneId::TriangleVertexBuffer,
        SceneId::CullModes,
        SceneId::TriangleStencil,
        SceneId::TriangleInstances,
        SceneId::TextureQuad,
        SceneId::TextureQuadMoving,
        SceneId::BasicCompute,
        SceneId::UniformsCompute,
        SceneId::SpriteBatchCompute,
    ];

    /// 1-based scene number.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            SceneId::Clear => "clear",
            SceneId::Triangle => "triangle",
            SceneId::TriangleVertexBuffer => "triangle-vertex-buffer",
            SceneId::CullModes => "cull-modes",
            SceneId::TriangleStencil => "triangle-stencil",
            SceneId::TriangleInstances => "triangle-instances",
            SceneId::TextureQuad => "texture-quad",
            SceneId::TextureQuadMoving => "texture-quad-moving",
            SceneId::BasicCompute => "basic-compute",
            SceneId::UniformsCompute => "uniforms-compute",
            SceneId::SpriteBatchCompute => "sprite-batch-compute",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SceneId::Clear => "clear the swapchain to black",
            SceneId::Triangle => "vertex-index triangle; wireframe, viewport and scissor toggles",
            SceneId::TriangleVertexBuffer => "triangle from an uploaded vertex buffer",
            SceneId::CullModes => "cull modes and winding orders side by side",
            SceneId::TriangleStencil => "stencil masking with masker and maskee pipelines",
            SceneId::TriangleInstances => "instanced and indexed drawing with offsets",
            SceneId::TextureQuad => "textured quad with six samplers",
            SceneId::TextureQuadMoving => "rotating quads with per-draw uniforms",
            SceneId::BasicCompute => "texture filled once by a compute shader",
            SceneId::UniformsCompute => "per-frame compute gradient driven by a uniform",
            SceneId::SpriteBatchCompute => "sprites expanded into vertices by compute",
        }
    }

    pub fn create(self) -> Box<dyn Scene> {
        match self {
            SceneId::Clear => Box::new(ClearScene::new()),
            SceneId::Triangle => Box::new(TriangleScene::new()),
            SceneId::TriangleVertexBuffer => Box::new(TriangleVertexBufferScene::new()),
            SceneId::CullModes => Box::new(CullModesScene::new()),
            SceneId::TriangleStencil => Box::new(TriangleStencilScene::new()),
            SceneId::TriangleInstances => Box::new(TriangleInstancesScene::new()),
            SceneId::TextureQuad => Box::new(TextureQuadScene::new()),
            SceneId::TextureQuadMoving => Box::new(TextureQuadMovingScene::new()),
            SceneId::BasicCompute => Box::new(BasicComputeScene::new()),
            SceneId::UniformsCompute => Box::new(UniformsComputeScene::new()),
            SceneId::SpriteBatchCompute => Box::new(SpriteBatchComputeScene::new()),
        }
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02} {}", self.number(), self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown scene {0:?}; expected a number from 1 to 11 or a scene name")]
pub struct UnknownScene(pub String);

impl FromStr for SceneId {
    type Err = UnknownScene;

    /// Accepts a scene number ("3", "03") or its name ("cull-modes").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let found = match s.parse::<u32>() {
            Ok(n) => SceneId::ALL.into_iter().find(|id| id.number() == n),
            Err(_) => SceneId::ALL
                .into_iter()
                .find(|id| id.name().eq_ignore_ascii_case(s)),
        };
        found.ok_or_else(|| UnknownScene(s.to_string()))
    }
}
