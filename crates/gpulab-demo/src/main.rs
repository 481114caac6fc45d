mod config;

use anyhow::Result;
use clap::Parser;

use gpulab_engine::logging::init_logging;
use gpulab_engine::window::Runtime;
use gpulab_scenes::SceneId;

use config::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logging());

    if cli.list {
        for id in SceneId::ALL {
            println!("{:<26} {}", id.to_string(), id.description());
        }
        return Ok(());
    }

    let renderer_init = cli.renderer_init();
    log::info!("scene {} (content roots: {:?})", cli.scene, renderer_init.content.roots());

    Runtime::run(cli.runtime(), renderer_init, cli.scene.create())
}
