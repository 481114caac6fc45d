use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::Scene;
use crate::device::{Renderer, RendererInit};
use crate::input::platform::winit::translate_window_event;
use crate::input::InputFrame;
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
    /// Frame rate cap enforced by the frame clock; 0 disables it.
    pub target_fps: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "gpulab".to_string(),
            initial_size: LogicalSize::new(640.0, 480.0),
            resizable: false,
            target_fps: 60,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, loads `scene` and drives it until it asks to exit.
    ///
    /// Each iteration polls input, updates the scene, draws it and waits out
    /// the rest of the frame interval. The scene is unloaded before the
    /// window closes.
    pub fn run(config: RuntimeConfig, renderer_init: RendererInit, scene: Box<dyn Scene>) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, renderer_init, scene);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    renderer: Renderer<'this>,
}

struct AppState {
    config: RuntimeConfig,
    renderer_init: RendererInit,
    scene: Box<dyn Scene>,

    entry: Option<WindowEntry>,
    input_frame: InputFrame,
    clock: FrameClock,

    scene_loaded: bool,
    exit_requested: bool,
    failure: Option<anyhow::Error>,
}

impl AppState {
    fn new(config: RuntimeConfig, renderer_init: RendererInit, scene: Box<dyn Scene>) -> Self {
        let clock = FrameClock::with_target_fps(config.target_fps);
        Self {
            config,
            renderer_init,
            scene,
            entry: None,
            input_frame: InputFrame::default(),
            clock,
            scene_loaded: false,
            exit_requested: false,
            failure: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let renderer_init = self.renderer_init.clone();
        let entry = WindowEntryTryBuilder {
            window,
            renderer_builder: |w| pollster::block_on(Renderer::new(w, renderer_init)),
        }
        .try_build()
        .context("renderer initialization failed")?;

        self.entry = Some(entry);
        Ok(())
    }

    fn load_scene(&mut self) -> Result<()> {
        let Some(entry) = self.entry.as_mut() else {
            return Ok(());
        };

        let scene = &mut self.scene;
        entry
            .with_renderer_mut(|renderer| scene.load(renderer))
            .with_context(|| format!("failed to load scene {}", scene.name()))?;

        self.scene_loaded = true;
        log::info!("loaded scene {}", self.scene.name());
        Ok(())
    }

    fn unload_scene(&mut self) {
        if !self.scene_loaded {
            return;
        }
        self.scene_loaded = false;

        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let scene = &mut self.scene;
        let snapshot = entry.with_renderer_mut(|renderer| {
            scene.unload(renderer);
            renderer.close()
        });

        if snapshot.is_balanced() {
            log::info!("unloaded scene {}", scene.name());
        } else {
            log::warn!("scene {} left resources alive: {snapshot}", scene.name());
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.shutdown(event_loop);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.unload_scene();
        self.exit_requested = true;
        event_loop.exit();
    }

    /// Runs one update/draw/delay iteration.
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let ft = self.clock.tick();
        let control = self.scene.update(ft.dt, &self.input_frame);

        // Clear per-frame events after the update consumed them.
        self.input_frame.clear();

        if control.is_exit() {
            self.shutdown(event_loop);
            return;
        }

        let scene = &mut self.scene;
        let drawn = entry.with_renderer_mut(|renderer| scene.draw(renderer));
        if let Err(e) = drawn {
            let name = self.scene.name();
            self.fail(event_loop, e.context(format!("scene {name} failed to draw")));
            return;
        }

        self.clock.delay();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e);
            return;
        }

        if let Err(e) = self.load_scene() {
            self.fail(event_loop, e);
            return;
        }

        event_loop.set_control_flow(ControlFlow::Poll);
        self.clock.reset();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        self.frame(event_loop);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if let Some(ev) = translate_window_event(&event) {
            self.input_frame.push_event(ev);
        }

        if let WindowEvent::Resized(new_size) = event {
            if let Some(entry) = self.entry.as_mut() {
                entry.with_renderer_mut(|renderer| renderer.resize(new_size));
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.unload_scene();
    }
}
