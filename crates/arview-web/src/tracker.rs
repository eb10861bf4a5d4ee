//! Bridge to the page's marker tracker
//!
//! The page exposes `window.arviewTracker` with these methods:
//! - `start(patternUrl)` returns `true` once the camera feed and pattern
//!   detector are running
//! - `update()` returns the marker pose as 16 column-major numbers, or
//!   `null` while the marker is out of view
//! - `projection()` (optional) returns the camera projection matching the
//!   video feed as 16 column-major numbers, or `null` until it is known

use arview_scene::MarkerTracker;
use js_sys::{Float32Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

/// Marker tracker backed by `window.arviewTracker`
pub struct JsMarkerTracker {
    tracker: JsValue,
    update_fn: Function,
    projection_fn: Option<Function>,
}

fn method(target: &JsValue, name: &str) -> Result<Function, String> {
    Reflect::get(target, &JsValue::from_str(name))
        .map_err(|e| format!("arviewTracker.{} lookup failed: {:?}", name, e))?
        .dyn_into::<Function>()
        .map_err(|_| format!("arviewTracker.{} is not a function", name))
}

impl JsMarkerTracker {
    /// Start the page's tracker on `pattern_url`
    pub fn connect(pattern_url: &str) -> Result<Self, String> {
        let window = web_sys::window().ok_or("No window")?;
        let tracker = Reflect::get(&window, &JsValue::from_str("arviewTracker"))
            .map_err(|e| format!("Tracker lookup failed: {:?}", e))?;
        if tracker.is_undefined() || tracker.is_null() {
            return Err("window.arviewTracker is not defined".to_string());
        }

        let start = method(&tracker, "start")?;
        let update_fn = method(&tracker, "update")?;
        let projection_fn = method(&tracker, "projection").ok();

        let started = start
            .call1(&tracker, &JsValue::from_str(pattern_url))
            .map_err(|e| format!("Tracker start failed: {:?}", e))?;
        if !started.is_truthy() {
            return Err("Tracker could not access the camera".to_string());
        }

        tracing::info!("Marker tracker started with pattern {}", pattern_url);
        Ok(Self {
            tracker,
            update_fn,
            projection_fn,
        })
    }
}

/// 16 numbers from a JS value, `None` for `null`, `undefined` or a bad length
fn read_matrix(value: JsValue, what: &str) -> Option<[f32; 16]> {
    if value.is_undefined() || value.is_null() {
        return None;
    }

    let array = Float32Array::new(&value);
    if array.length() != 16 {
        tracing::warn!("Ignoring {} with {} elements", what, array.length());
        return None;
    }
    let mut matrix = [0.0; 16];
    array.copy_to(&mut matrix);
    Some(matrix)
}

impl MarkerTracker for JsMarkerTracker {
    fn update(&mut self) -> Option<[f32; 16]> {
        let value = self.update_fn.call0(&self.tracker).ok()?;
        read_matrix(value, "marker pose")
    }

    fn projection(&mut self) -> Option<[f32; 16]> {
        let value = self.projection_fn.as_ref()?.call0(&self.tracker).ok()?;
        read_matrix(value, "camera projection")
    }
}
