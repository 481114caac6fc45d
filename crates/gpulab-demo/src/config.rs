use std::path::PathBuf;

use clap::Parser;
use winit::dpi::LogicalSize;

use gpulab_engine::content::ContentPaths;
use gpulab_engine::device::RendererInit;
use gpulab_engine::logging::LoggingConfig;
use gpulab_engine::window::RuntimeConfig;
use gpulab_scenes::{SceneId, CONTENT_ROOT};

/// Runs one of the gpulab rendering demo scenes.
#[derive(Debug, Parser)]
#[command(name = "gpulab", version, about)]
pub struct Cli {
    /// Scene to run, by number (1-11) or name.
    #[arg(short, long, default_value = "clear")]
    pub scene: SceneId,

    /// Window width in logical pixels.
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Window height in logical pixels.
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Frame rate cap; 0 runs uncapped.
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Extra content root searched before the defaults.
    #[arg(long, value_name = "DIR")]
    pub content: Option<PathBuf>,

    /// Log filter in env_logger syntax (overrides RUST_LOG).
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,

    /// Print the available scenes and exit.
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log.clone(),
            ..Default::default()
        }
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: format!("gpulab - {}", self.scene.name()),
            initial_size: LogicalSize::new(f64::from(self.width), f64::from(self.height)),
            target_fps: self.fps,
            ..Default::default()
        }
    }

    /// Content roots in lookup order: `--content`, the executable
    /// directory, then the scenes crate.
    pub fn content_paths(&self) -> ContentPaths {
        let mut paths = ContentPaths::new(self.content.clone());
        for root in ContentPaths::from_exe_dir().roots() {
            paths.push(root.clone());
        }
        paths.push(CONTENT_ROOT);
        paths
    }

    pub fn renderer_init(&self) -> RendererInit {
        RendererInit {
            content: self.content_paths(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_window() {
        let cli = Cli::try_parse_from(["gpulab"]).unwrap();
        assert_eq!(cli.scene, SceneId::Clear);
        assert_eq!((cli.width, cli.height, cli.fps), (640, 480, 60));
        assert!(!cli.list);

        let runtime = cli.runtime();
        assert_eq!(runtime.initial_size, LogicalSize::new(640.0, 480.0));
        assert!(!runtime.resizable);
    }

    #[test]
    fn scene_accepts_numbers_and_names() {
        let cli = Cli::try_parse_from(["gpulab", "--scene", "05"]).unwrap();
        assert_eq!(cli.scene, SceneId::TriangleStencil);

        let cli = Cli::try_parse_from(["gpulab", "-s", "sprite-batch-compute"]).unwrap();
        assert_eq!(cli.scene, SceneId::SpriteBatchCompute);

        assert!(Cli::try_parse_from(["gpulab", "--scene", "99"]).is_err());
    }

    #[test]
    fn content_override_is_searched_first() {
        let cli = Cli::try_parse_from(["gpulab", "--content", "/opt/gpulab"]).unwrap();
        let paths = cli.content_paths();
        assert_eq!(paths.roots()[0], PathBuf::from("/opt/gpulab"));
        assert_eq!(paths.roots().last(), Some(&PathBuf::from(CONTENT_ROOT)));
    }

    #[test]
    fn log_filter_flows_into_logging_config() {
        let cli = Cli::try_parse_from(["gpulab", "--log", "debug", "--fps", "0"]).unwrap();
        assert_eq!(cli.logging().env_filter.as_deref(), Some("debug"));
        assert_eq!(cli.runtime().target_fps, 0);
    }
}
