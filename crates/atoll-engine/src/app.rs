//! Application lifecycle.
//!
//! Owns the window, the presenter and the game session, and runs the
//! fixed-tick loop off winit's redraw events.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use atoll_common::tick::TICKS_PER_SECOND;
use atoll_gameplay::session::GameSession;
use atoll_world::render::AssetStore;
use atoll_world::storage::SaveLayout;
use image::RgbaImage;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::assets::{find_assets_dir, load_textures};
use crate::config::EngineConfig;
use crate::events::{EngineEvent, EventBus};
use crate::input::InputHandler;
use crate::presenter::Presenter;
use crate::timing::{FixedTimestep, FpsCounter};

/// Application state.
struct AtollApp {
    config: EngineConfig,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,

    session: Option<GameSession>,
    textures: AssetStore,
    assets_dir: Option<PathBuf>,
    frame: RgbaImage,

    input: InputHandler,
    events: EventBus,
    timestep: FixedTimestep,
    fps: FpsCounter,
}

impl AtollApp {
    fn new(config: EngineConfig, session: GameSession) -> Self {
        let events = EventBus::new();
        let assets_dir = find_assets_dir();
        let textures = load_textures(assets_dir.as_deref());
        let frame = frame_for(
            PhysicalSize::new(config.window_width, config.window_height),
            config.render_scale,
        );
        let timestep = FixedTimestep::new(config.tick_rate);
        debug!("Fixed tick of {:?}", timestep.tick());
        Self {
            timestep,
            input: InputHandler::new(events.publisher()),
            config,
            window: None,
            presenter: None,
            session: Some(session),
            textures,
            assets_dir,
            frame,
            events,
            fps: FpsCounter::new(120),
        }
    }

    /// Runs the ticks due, handles engine events and presents a frame.
    fn update_and_render(&mut self) {
        let now = Instant::now();
        let ticks = self.timestep.advance(now);
        if let Some(session) = &mut self.session {
            for _ in 0..ticks {
                session.update(self.input.state());
                self.input.end_tick();
            }
        }

        for event in self.events.drain() {
            self.handle_engine_event(event);
        }

        let Some(session) = &mut self.session else {
            return;
        };
        let stats = session.draw(&mut self.frame, &self.textures);
        self.fps.frame(now);
        if session.is_debug() && ticks > 0 && session.clock().now() % TICKS_PER_SECOND == 0 {
            debug!(
                "{:.1} fps, {} chunks drawn, {} repainted",
                self.fps.fps(),
                stats.chunks_drawn,
                stats.chunks_redrawn
            );
        }

        if let Some(presenter) = &mut self.presenter {
            if let Err(e) = presenter.present(&self.frame) {
                warn!("Failed to present frame: {e:#}");
            }
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Reload => {
                info!("Reloading assets");
                self.assets_dir = find_assets_dir();
                self.textures = load_textures(self.assets_dir.as_deref());
                if let Some(session) = &mut self.session {
                    session.redraw_all();
                }
            },
            EngineEvent::Save => {
                if let Some(session) = &mut self.session {
                    if let Err(e) = session.save() {
                        error!("Save failed: {e}");
                    }
                }
            },
        }
    }

    fn shutdown(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        info!("Saving game {}", session.base());
        if let Err(e) = session.close() {
            error!("Failed to save on exit: {e}");
        }
    }
}

/// CPU frame for a window of `size` at `scale` window pixels per frame pixel.
fn frame_for(size: PhysicalSize<u32>, scale: u32) -> RgbaImage {
    let scale = scale.max(1);
    RgbaImage::new((size.width / scale).max(1), (size.height / scale).max(1))
}

impl ApplicationHandler for AtollApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        info!("Application resumed, creating window...");

        let window_attrs = Window::default_attributes()
            .with_title("Atoll")
            .with_inner_size(PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        match event_loop.create_window(window_attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                match pollster::block_on(Presenter::new(Arc::clone(&window), self.config.vsync)) {
                    Ok(presenter) => self.presenter = Some(presenter),
                    Err(e) => warn!("Failed to initialize presenter: {e:#}"),
                }
                self.frame = frame_for(window.inner_size(), self.config.render_scale);
                window.request_redraw();
                self.window = Some(window);
                self.timestep.reset(Instant::now());
            },
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
            },
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.input.handle_event(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down...");
                if let Err(e) = self.config.save() {
                    warn!("Failed to save config: {e}");
                }
                self.shutdown();
                event_loop.exit();
            },
            WindowEvent::Resized(size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(size);
                }
                self.config.window_width = size.width;
                self.config.window_height = size.height;
                self.frame = frame_for(size, self.config.render_scale);
            },
            WindowEvent::RedrawRequested => {
                self.update_and_render();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            },
            _ => {},
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

/// Runs the game until the window closes.
pub fn run() -> Result<()> {
    let mut config = EngineConfig::load();
    config.validate();
    info!("Window: {}x{}", config.window_width, config.window_height);
    info!("Saves: {}", config.saves_dir.display());

    let layout = SaveLayout::new(config.saves_dir.clone());
    let session = GameSession::open_latest(layout, config.world_config(), config.seed())?;
    info!("Playing {}", session.base());

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = AtollApp::new(config, session);
    event_loop.run_app(&mut app)?;
    Ok(())
}
