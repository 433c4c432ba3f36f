//! Standalone viewer window backed by winit.
//!
//! Every `RedrawRequested` runs one frame (controller, clock, load poll,
//! mixer, render) and asks for the next one, so the loop runs until the
//! window is closed. With the `gui` feature a wry webview panel overlays
//! the right edge of the viewport.
//!
//! ```no_run
//! # use diorama::Viewer;
//! Viewer::builder()
//!     .with_model_path("assets/models/LittlestTokyo.glb")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    engine::Engine,
    error::DioramaError,
    input::{event::scroll_lines, InputEvent, MouseButton},
    options::Options,
};

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    options: Options,
    title: String,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            options: Options::default(),
            title: "diorama".into(),
        }
    }

    /// Replace all options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Load the model at `path` instead of the configured one.
    #[must_use]
    pub fn with_model_path(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            self.options.model.dir = dir.to_string_lossy().into_owned();
        }
        if let Some(file) = path.file_name() {
            self.options.model.file = file.to_string_lossy().into_owned();
        }
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            options: self.options,
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A window showing the diorama.
pub struct Viewer {
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Options the viewer will start with.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`DioramaError::Viewer`] if the event loop cannot be created
    /// or exits abnormally.
    pub fn run(self) -> Result<(), DioramaError> {
        let event_loop =
            EventLoop::new().map_err(|e| DioramaError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            window: None,
            engine: None,
            options: Some(self.options),
            title: self.title,
            #[cfg(feature = "gui")]
            panel: crate::gui::panel::PanelController::new(),
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| DioramaError::Viewer(e.to_string()))
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

struct ViewerApp {
    window: Option<Arc<Window>>,
    engine: Option<Engine>,
    /// Taken when the engine is built.
    options: Option<Options>,
    title: String,
    #[cfg(feature = "gui")]
    panel: crate::gui::panel::PanelController,
}

/// The wgpu surface always covers the full window. A minimised window
/// reports 0x0, which the engine ignores.
fn viewport_size(inner: winit::dpi::PhysicalSize<u32>) -> (u32, u32) {
    (inner.width, inner.height)
}

impl ViewerApp {
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(engine)) = (&self.window, &mut self.engine)
        else {
            return;
        };

        #[cfg(feature = "gui")]
        self.panel.drain_and_apply(window, engine.stage_mut());

        let _ = engine.update();
        match engine.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                engine.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory, stopping");
                event_loop.exit();
                return;
            }
            Err(e) => log::error!("render error: {e:?}"),
        }

        #[cfg(feature = "gui")]
        self.panel.push_if_due(std::time::Instant::now(), engine.stage());

        window.request_redraw();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());
        let attrs = if let Some(mon) = &monitor {
            let mon_size = mon.size();
            let scale = mon.scale_factor();
            let logical_w = (f64::from(mon_size.width) / scale * 0.75) as u32;
            let logical_h = (f64::from(mon_size.height) / scale * 0.75) as u32;
            Window::default_attributes()
                .with_title(&self.title)
                .with_inner_size(winit::dpi::LogicalSize::new(
                    logical_w, logical_h,
                ))
        } else {
            Window::default_attributes().with_title(&self.title)
        };

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let options = self.options.take().unwrap_or_default();
        let size = viewport_size(window.inner_size());
        let engine =
            match pollster::block_on(Engine::new(window.clone(), size, options))
            {
                Ok(e) => e,
                Err(e) => {
                    log::error!("failed to initialize engine: {e}");
                    event_loop.exit();
                    return;
                }
            };

        #[cfg(feature = "gui")]
        self.panel.init_webview(window.as_ref(), engine.stage());

        window.request_redraw();
        self.window = Some(window);
        self.engine = Some(engine);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            log::info!("window closed");
            event_loop.exit();
            return;
        }

        if self.window.is_none() || self.engine.is_none() {
            return;
        }

        match event {
            WindowEvent::Resized(inner) => {
                let (w, h) = viewport_size(inner);
                if let Some(engine) = &mut self.engine {
                    engine.resize(w, h);
                }
                #[cfg(feature = "gui")]
                if let (Some(window), Some(engine)) =
                    (&self.window, &self.engine)
                {
                    self.panel
                        .apply_layout(window, engine.stage().panel().is_visible());
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            WindowEvent::MouseInput { button, state, .. } => {
                self.send_input(InputEvent::MouseButton {
                    button: MouseButton::from(button),
                    pressed: state == ElementState::Pressed,
                });
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.send_input(InputEvent::CursorMoved {
                    x: position.x as f32,
                    y: position.y as f32,
                });
            }

            WindowEvent::CursorLeft { .. } => {
                self.send_input(InputEvent::CursorLeft);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.send_input(InputEvent::Scroll {
                    delta: scroll_lines(delta),
                });
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                if event.physical_key == PhysicalKey::Code(KeyCode::Backslash) {
                    self.toggle_panel();
                }
            }

            _ => (),
        }
    }
}

impl ViewerApp {
    fn send_input(&mut self, event: InputEvent) {
        if let Some(engine) = &mut self.engine {
            engine.handle_input(event);
        }
    }

    fn toggle_panel(&mut self) {
        #[cfg(feature = "gui")]
        if let (Some(window), Some(engine)) = (&self.window, &mut self.engine)
        {
            self.panel.toggle(window, engine.stage_mut());
        }
        #[cfg(not(feature = "gui"))]
        if let Some(engine) = &mut self.engine {
            let _ = engine.stage_mut().panel_mut().toggle();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_path_splits_into_dir_and_file() {
        let viewer = Viewer::builder()
            .with_model_path("some/dir/scene.gltf")
            .build();
        assert_eq!(viewer.options().model.dir, "some/dir");
        assert_eq!(viewer.options().model.file, "scene.gltf");
    }

    #[test]
    fn builder_keeps_other_options() {
        let mut options = Options::default();
        options.model.scale = 2.0;
        let viewer = Viewer::builder()
            .with_options(options)
            .with_model_path("a.glb")
            .build();
        assert_eq!(viewer.options().model.scale, 2.0);
        assert_eq!(viewer.options().model.file, "a.glb");
        assert_eq!(viewer.options().model.dir, "");
    }

    #[test]
    fn minimised_window_size_passes_through() {
        assert_eq!(
            viewport_size(winit::dpi::PhysicalSize::new(0, 0)),
            (0, 0)
        );
        assert_eq!(
            viewport_size(winit::dpi::PhysicalSize::new(1024, 768)),
            (1024, 768)
        );
    }
}
