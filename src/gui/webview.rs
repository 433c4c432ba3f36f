//! Wry webview child of the winit window.
//!
//! Creates a [`wry::WebView`] at the right edge of the window, loads a
//! self-contained HTML page and bridges IPC between the page and the
//! native stage. The page renders whatever [`PanelSnapshot`] it is sent
//! as number inputs; edits come back as `set_field` messages.

use std::sync::mpsc;

use wry::{dpi, Rect, WebView, WebViewBuilder};

use crate::panel::PanelSnapshot;

/// Width of the panel in physical pixels.
pub const PANEL_WIDTH: u32 = 260;

/// Actions sent from the webview page to the native side.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Write a panel field.
    SetField {
        /// Field name (e.g. `"intensity"`).
        name: String,
        /// New value, unvalidated.
        value: f32,
    },
    /// Show/hide request from the page's close button.
    TogglePanel,
}

/// Create the webview as a child of `window`.
///
/// Returns `(webview, action_rx)`; the receiver yields [`UiAction`]s from
/// the page.
pub fn create_webview<W: wry::raw_window_handle::HasWindowHandle>(
    window: &W,
    window_width: u32,
    window_height: u32,
) -> Result<(WebView, mpsc::Receiver<UiAction>), wry::Error> {
    #[cfg(target_os = "linux")]
    init_gtk();

    let (tx, rx) = mpsc::channel();

    let webview = WebViewBuilder::new()
        .with_bounds(panel_bounds(window_width, window_height))
        .with_transparent(true)
        .with_html(PANEL_HTML)
        .with_ipc_handler(move |req| {
            let body = req.body();
            let Ok(msg) = serde_json::from_str::<serde_json::Value>(body)
            else {
                log::debug!("ignoring malformed panel message: {body}");
                return;
            };
            if let Some(action) = parse_action(&msg) {
                let _ = tx.send(action);
            }
        })
        .build_as_child(window)?;

    Ok((webview, rx))
}

/// Pump pending gtk events. Wry's Linux backend needs this once per frame
/// when it is embedded in a winit loop.
pub fn pump_events() {
    #[cfg(target_os = "linux")]
    while gtk::events_pending() {
        let _ = gtk::main_iteration_do(false);
    }
}

#[cfg(target_os = "linux")]
fn init_gtk() {
    if gtk::is_initialized() {
        return;
    }
    if let Err(e) = gtk::init() {
        log::error!("gtk init failed: {e}");
    }
}

/// The panel's rect at the right edge of the window.
#[must_use]
pub fn panel_bounds(window_width: u32, window_height: u32) -> Rect {
    let x = window_width.saturating_sub(PANEL_WIDTH);
    Rect {
        position: dpi::Position::Physical(dpi::PhysicalPosition::new(
            x as i32, 0,
        )),
        size: dpi::Size::Physical(dpi::PhysicalSize::new(
            PANEL_WIDTH.min(window_width),
            window_height,
        )),
    }
}

/// Rect that parks the panel just past the right edge.
#[must_use]
pub fn hidden_bounds(window_width: u32, window_height: u32) -> Rect {
    Rect {
        position: dpi::Position::Physical(dpi::PhysicalPosition::new(
            window_width as i32,
            0,
        )),
        size: dpi::Size::Physical(dpi::PhysicalSize::new(
            PANEL_WIDTH,
            window_height,
        )),
    }
}

/// Push the current panel state to the page.
pub fn push_snapshot(webview: &WebView, snapshot: &PanelSnapshot) {
    let json = serde_json::to_string(snapshot).unwrap_or_default();
    let _ = webview
        .evaluate_script(&format!("window.__diorama_push_panel('{}')", escape(&json)));
}

fn escape(json: &str) -> String {
    json.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Parse an IPC message from the page into a [`UiAction`].
fn parse_action(msg: &serde_json::Value) -> Option<UiAction> {
    match msg.get("action")?.as_str()? {
        "set_field" => {
            let name = msg.get("name")?.as_str()?.to_owned();
            let value = msg.get("value")?.as_f64()? as f32;
            Some(UiAction::SetField { name, value })
        }
        "toggle_panel" => Some(UiAction::TogglePanel),
        other => {
            log::debug!("unknown panel action {other}");
            None
        }
    }
}

/// Page shown in the webview. `__diorama_push_panel` rebuilds the inputs
/// when the field set changes and otherwise only refreshes values, so an
/// input being typed into keeps focus.
const PANEL_HTML: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<style>
  body { margin: 0; font: 12px system-ui, sans-serif; color: #ddd;
         background: rgba(24, 24, 28, 0.92); }
  header { display: flex; justify-content: space-between;
           padding: 6px 8px; background: #111; }
  header button { background: none; border: 0; color: #aaa; cursor: pointer; }
  fieldset { border: 0; border-top: 1px solid #333; margin: 0;
             padding: 6px 8px; }
  legend { padding: 0 4px; color: #9cf; }
  label { display: flex; justify-content: space-between; margin: 4px 0; }
  input { width: 110px; background: #222; color: #eee;
          border: 1px solid #444; }
</style>
</head>
<body>
<header><span>Parameters</span><button id="close">&times;</button></header>
<div id="folders"></div>
<script>
(function() {
  var shape = null;
  var root = document.getElementById('folders');

  function send(msg) { window.ipc.postMessage(JSON.stringify(msg)); }

  document.getElementById('close').onclick = function() {
    send({ action: 'toggle_panel' });
  };

  function build(snapshot) {
    root.innerHTML = '';
    snapshot.folders.forEach(function(folder) {
      var set = document.createElement('fieldset');
      var legend = document.createElement('legend');
      legend.textContent = folder.title;
      set.appendChild(legend);
      folder.fields.forEach(function(field) {
        var label = document.createElement('label');
        label.textContent = field.name;
        var input = document.createElement('input');
        input.type = 'number';
        input.step = field.step;
        input.id = 'field-' + field.name;
        input.oninput = function() {
          var v = parseFloat(input.value);
          if (!isNaN(v)) {
            send({ action: 'set_field', name: field.name, value: v });
          }
        };
        label.appendChild(input);
        set.appendChild(label);
      });
      root.appendChild(set);
    });
  }

  window.__diorama_push_panel = function(json) {
    var snapshot = JSON.parse(json);
    var next = JSON.stringify(snapshot.folders.map(function(f) {
      return [f.title, f.fields.map(function(x) { return x.name; })];
    }));
    if (next !== shape) {
      build(snapshot);
      shape = next;
    }
    snapshot.folders.forEach(function(folder) {
      folder.fields.forEach(function(field) {
        var input = document.getElementById('field-' + field.name);
        if (input && document.activeElement !== input
            && field.value !== null) {
          input.value = Math.round(field.value * 1000) / 1000;
        }
      });
    });
  };
})();
</script>
</body>
</html>
"#;
