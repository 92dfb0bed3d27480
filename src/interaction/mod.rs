pub mod drag;

pub use drag::DragController;

use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, OverlayResult};
use crate::orders::OrderId;

/// Host-configurable interaction input gates aligned with Lightweight Charts
/// `handleScroll` / `handleScale` behavior families.
///
/// The drag controller captures the active settings before a drag and applies
/// [`InteractionSettings::all_disabled`] for its duration, so a drag gesture
/// never pans or zooms the chart underneath the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionSettings {
    /// Master enable for scroll-family interactions.
    pub handle_scroll: bool,
    /// Master enable for scale-family interactions.
    pub handle_scale: bool,
    /// Enables wheel-driven horizontal scroll/pan.
    pub scroll_mouse_wheel: bool,
    /// Enables pressed-mouse drag scrolling.
    pub scroll_pressed_mouse_move: bool,
    /// Enables wheel-driven zoom.
    pub scale_mouse_wheel: bool,
    /// Enables pinch-driven zoom.
    pub scale_pinch: bool,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            handle_scroll: true,
            handle_scale: true,
            scroll_mouse_wheel: true,
            scroll_pressed_mouse_move: true,
            scale_mouse_wheel: true,
            scale_pinch: true,
        }
    }
}

impl InteractionSettings {
    /// Settings applied while a handle drag is in flight.
    #[must_use]
    pub const fn all_disabled() -> Self {
        Self {
            handle_scroll: false,
            handle_scale: false,
            scroll_mouse_wheel: false,
            scroll_pressed_mouse_move: false,
            scale_mouse_wheel: false,
            scale_pinch: false,
        }
    }
}

/// Pointer cursor affordance requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    /// Hovering a draggable handle.
    Grab,
    /// A handle drag is in flight.
    Grabbing,
}

/// Which handle of an order a drag is bound to.
///
/// Entry lines are intentionally not draggable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragTarget {
    StopLoss,
    TakeProfit,
}

/// Drag session state. At most one session exists per chart instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        order_id: OrderId,
        target: DragTarget,
    },
}

/// Tuning for handle hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragConfig {
    /// Maximum vertical pixel distance between pointer and line to qualify.
    pub hit_threshold_px: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            hit_threshold_px: 6.0,
        }
    }
}

impl DragConfig {
    pub fn validate(self) -> OverlayResult<Self> {
        if !self.hit_threshold_px.is_finite() || self.hit_threshold_px <= 0.0 {
            return Err(OverlayError::InvalidConfig(
                "drag hit threshold must be finite and > 0".to_owned(),
            ));
        }
        Ok(self)
    }
}
