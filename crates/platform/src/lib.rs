//! Platform layer: windowing, event loop and the viewer's setup/teardown.
//!
//! Order of work:
//! - Assets (OBJ/MTL, textures, shader text) are read before any window opens.
//! - The window, context and GPU resources are created on `resumed`.
//! - Each redraw draws and presents one frame; the exit check runs once
//!   pending events have been handled (`about_to_wait`).
//! - GPU handles are released before the window and context go away.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use asset::ViewerAssets;
use corelib::{ViewerConfig, ViewerError};
use renderer::{ExitSignals, FrameScheduler, LoopState, ResourceManager, WgpuBackend};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Load assets, open the window and render until Escape or close.
pub fn run(config: ViewerConfig) -> Result<()> {
    config.validate()?;
    let assets = ViewerAssets::load(&config).context("Failed to load model assets")?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = ViewerApp::new(config, assets);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow::anyhow!("Event loop error: {e:?}"))?;

    app.finish()
}

/// Everything that lives while the window is open.
struct Session {
    resources: ResourceManager<WgpuBackend>,
    scheduler: FrameScheduler,
}

impl Session {
    fn window(&self) -> &Window {
        self.resources.backend().window()
    }

    fn shutdown(mut self) {
        log::info!("Rendered {} frame(s); releasing GPU resources", self.scheduler.frames());
        self.resources.release();
    }
}

struct ViewerApp {
    config: ViewerConfig,
    assets: Option<ViewerAssets>,
    session: Option<Session>,
    signals: ExitSignals,
    error: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(config: ViewerConfig, assets: ViewerAssets) -> Self {
        Self {
            config,
            assets: Some(assets),
            session: None,
            signals: ExitSignals::default(),
            error: None,
        }
    }

    fn init_session(&self, event_loop: &ActiveEventLoop, assets: &ViewerAssets) -> Result<Session> {
        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(false);
        let window = event_loop
            .create_window(attributes)
            .map_err(|e| ViewerError::Context(format!("failed to open window: {e}")))?;
        let window = Arc::new(window);
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let backend = WgpuBackend::new(window, &self.config)?;
        let resources = ResourceManager::setup(backend, assets)?;
        let mut scheduler = FrameScheduler::new(&self.config);
        scheduler.start(&resources)?;
        Ok(Session {
            resources,
            scheduler,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.record_failure(err);
        event_loop.exit();
    }

    /// Keep the first error for `run` to return; `main` reports it.
    fn record_failure(&mut self, err: anyhow::Error) {
        if let Some(session) = self.session.take() {
            session.shutdown();
        }
        self.error.get_or_insert(err);
    }

    fn finish(mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            session.shutdown();
        }
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Setup runs once; the assets are consumed by it.
        let Some(assets) = self.assets.take() else {
            return;
        };
        match self.init_session(event_loop, &assets) {
            Ok(session) => {
                session.window().request_redraw();
                self.session = Some(session);
            }
            Err(err) => self.fail(event_loop, err.context("Viewer setup failed")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested.");
                self.signals.close_requested = true;
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                log::info!("Escape pressed.");
                self.signals.escape_pressed = true;
            }
            WindowEvent::RedrawRequested => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                let Session {
                    resources,
                    scheduler,
                } = session;
                if let Err(err) = scheduler.render(resources, Instant::now()) {
                    self.fail(event_loop, anyhow::Error::new(err).context("Frame failed"));
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.scheduler.end_iteration(self.signals) {
            LoopState::Stopped => {
                if let Some(session) = self.session.take() {
                    session.shutdown();
                }
                event_loop.exit();
            }
            _ => session.window().request_redraw(),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = self.session.take() {
            session.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use asset::{ModelData, ShaderSources};

    use super::*;

    fn idle_app() -> ViewerApp {
        let assets = ViewerAssets {
            model: ModelData {
                parts: Vec::new(),
                materials: Vec::new(),
            },
            textures: Vec::new(),
            shaders: ShaderSources::from_strings("", ""),
        };
        ViewerApp::new(ViewerConfig::default(), assets)
    }

    #[test]
    fn clean_exit_returns_ok() {
        assert!(idle_app().finish().is_ok());
    }

    #[test]
    fn first_failure_is_handed_back_once() {
        let mut app = idle_app();
        app.record_failure(anyhow::anyhow!("shader rejected").context("Viewer setup failed"));
        app.record_failure(anyhow::anyhow!("later failure"));

        let err = app.finish().unwrap_err();
        assert_eq!(format!("{err:#}"), "Viewer setup failed: shader rejected");
    }
}
