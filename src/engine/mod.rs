//! Composition root.
//!
//! [`Stage`] holds everything that does not need a GPU (scene, camera,
//! orbit controller, panel, model slot, frame clock). [`Engine`] adds the
//! render surface and the scene renderer on top and is what the viewer
//! drives once per `RedrawRequested`.

pub mod stage;

pub use stage::{ModelSlot, Stage, MODEL_ROOT_NAME};

use crate::error::DioramaError;
use crate::gpu::render_context::RenderContext;
use crate::input::InputEvent;
use crate::options::Options;
use crate::renderer::SceneRenderer;

/// Frames between debug frame-rate reports.
const STATS_INTERVAL: u64 = 600;

/// Render surface, renderer and stage.
pub struct Engine {
    context: RenderContext,
    renderer: SceneRenderer,
    stage: Stage,
}

impl Engine {
    /// Acquire a surface for `window`, build the scene from `options` and
    /// start loading the configured model.
    ///
    /// # Errors
    ///
    /// Returns [`DioramaError::Surface`] if no graphics context can be
    /// created. Model load failures are not reported here; they surface
    /// later through [`Stage::model`].
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        options: Options,
    ) -> Result<Self, DioramaError> {
        let context = RenderContext::new(window, size).await?;
        let (width, height) = context.size();
        let stage = Stage::from_options(options, width, height);
        let renderer = SceneRenderer::new(&context, &stage.options().renderer);
        Ok(Self {
            context,
            renderer,
            stage,
        })
    }

    /// Resize the surface, depth buffer and camera. Zero sizes and repeats
    /// of the current size are no-ops.
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.context.resize(width, height) {
            return;
        }
        self.renderer.resize(&self.context.device, width, height);
        self.stage.resize(width, height);
        log::debug!("resized to {width}x{height}");
    }

    /// Reconfigure the swapchain at its current size.
    pub fn reconfigure(&self) {
        self.context.reconfigure();
    }

    /// Run the non-GPU half of a frame. Returns the delta used.
    pub fn update(&mut self) -> f32 {
        let delta = self.stage.tick();
        if self.stage.frame_count() % STATS_INTERVAL == 0 {
            log::debug!(
                "{:.1} fps, {} meshes uploaded",
                self.stage.fps(),
                self.renderer.uploaded_meshes()
            );
        }
        delta
    }

    /// Draw the current scene and present it.
    ///
    /// # Errors
    ///
    /// Returns the [`wgpu::SurfaceError`] from acquiring the swapchain
    /// texture; `Lost`/`Outdated` are recoverable with
    /// [`reconfigure`](Self::reconfigure).
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.get_next_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer.render(
            &self.context,
            &view,
            self.stage.scene(),
            self.stage.camera(),
        );
        frame.present();
        Ok(())
    }

    /// Forward a pointer event to the stage.
    pub fn handle_input(&mut self, event: InputEvent) {
        self.stage.handle_input(event);
    }

    /// Headless state.
    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Mutable headless state (panel writes, extra loads).
    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Surface size in physical pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.context.size()
    }
}
