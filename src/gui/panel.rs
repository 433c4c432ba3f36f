//! GUI panel controller: owns the wry webview and its visibility.
//!
//! Keeps `ViewerApp` down to a single `#[cfg(feature = "gui")]` field.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use winit::window::Window;

use super::webview::{self, UiAction};
use crate::engine::Stage;

/// Owns the webview panel and all associated state.
pub(crate) struct PanelController {
    webview: Option<wry::WebView>,
    action_rx: Option<mpsc::Receiver<UiAction>>,
    last_push: Instant,
}

impl PanelController {
    /// How often live values are re-sent to the page.
    const PUSH_INTERVAL: Duration = Duration::from_millis(250);

    /// Controller with no webview yet.
    pub(crate) fn new() -> Self {
        Self {
            webview: None,
            action_rx: None,
            last_push: Instant::now(),
        }
    }

    /// Create the webview and send it the initial panel state.
    pub(crate) fn init_webview(&mut self, window: &Window, stage: &Stage) {
        let inner = window.inner_size();
        match webview::create_webview(window, inner.width, inner.height) {
            Ok((wv, rx)) => {
                webview::push_snapshot(&wv, &stage.panel_snapshot());
                self.webview = Some(wv);
                self.action_rx = Some(rx);
                self.apply_layout(window, stage.panel().is_visible());
            }
            Err(e) => {
                // The viewer keeps running without a panel.
                log::error!("failed to create webview: {e}");
            }
        }
    }

    /// Show or park the webview.
    pub(crate) fn apply_layout(&self, window: &Window, visible: bool) {
        let Some(ref wv) = self.webview else {
            return;
        };
        let inner = window.inner_size();
        let bounds = if visible {
            webview::panel_bounds(inner.width, inner.height)
        } else {
            webview::hidden_bounds(inner.width, inner.height)
        };
        let _ = wv.set_bounds(bounds);
    }

    /// Flip panel visibility and move the webview accordingly.
    pub(crate) fn toggle(&self, window: &Window, stage: &mut Stage) {
        let visible = stage.panel_mut().toggle();
        log::debug!("panel {}", if visible { "shown" } else { "hidden" });
        self.apply_layout(window, visible);
    }

    /// Apply queued page actions to the stage.
    pub(crate) fn drain_and_apply(&self, window: &Window, stage: &mut Stage) {
        webview::pump_events();
        let Some(ref rx) = self.action_rx else {
            return;
        };
        let mut toggled = false;
        while let Ok(action) = rx.try_recv() {
            match action {
                UiAction::SetField { name, value } => {
                    if !stage.set_panel_field(&name, value) {
                        log::debug!("panel field {name} not applied");
                    }
                }
                UiAction::TogglePanel => toggled = !toggled,
            }
        }
        if toggled {
            self.toggle(window, stage);
        }
    }

    /// Re-send live values a few times a second.
    pub(crate) fn push_if_due(&mut self, now: Instant, stage: &Stage) {
        let Some(ref wv) = self.webview else {
            return;
        };
        if now.duration_since(self.last_push) >= Self::PUSH_INTERVAL {
            webview::push_snapshot(wv, &stage.panel_snapshot());
            self.last_push = now;
        }
    }
}
