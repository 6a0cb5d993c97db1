//! Layer visibility and opacity table.
//!
//! Layers are numeric buckets controlling shared visibility/opacity across
//! a set of events, independent of scope/group/section membership. Layers
//! gate painting, not layout: a row on a hidden layer still occupies its
//! slot. Unknown layer ids read as fully visible at full opacity, so
//! callers never need to pre-register layers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Render state for one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerState {
    pub visible: bool,
    /// 0 (transparent) ..= 255 (opaque).
    pub opacity: u8,
}

impl Default for LayerState {
    fn default() -> Self {
        Self {
            visible: true,
            opacity: 255,
        }
    }
}

/// Maps layer id to `{visible, opacity}`, defaulting unknown ids to
/// `{true, 255}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerTable {
    states: HashMap<i32, LayerState>,
}

impl LayerTable {
    /// Creates an empty table (every layer visible at full opacity).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the opacity for `layer`, clamping into 0..=255.
    pub fn set_opacity(&mut self, layer: i32, opacity: i32) {
        let clamped = opacity.clamp(0, 255) as u8;
        self.states.entry(layer).or_default().opacity = clamped;
    }

    /// Sets visibility for `layer`.
    pub fn set_visible(&mut self, layer: i32, visible: bool) {
        self.states.entry(layer).or_default().visible = visible;
    }

    /// Hides every event on `layer`.
    pub fn hide_layer(&mut self, layer: i32) {
        self.set_visible(layer, false);
    }

    /// Shows every event on `layer`.
    pub fn show_layer(&mut self, layer: i32) {
        self.set_visible(layer, true);
    }

    /// Whether `layer` is visible (unknown layers are).
    pub fn is_visible(&self, layer: i32) -> bool {
        self.state(layer).visible
    }

    /// Opacity of `layer` (255 for unknown layers).
    pub fn opacity_of(&self, layer: i32) -> u8 {
        self.state(layer).opacity
    }

    /// Full state for `layer`.
    pub fn state(&self, layer: i32) -> LayerState {
        self.states.get(&layer).copied().unwrap_or_default()
    }
}
