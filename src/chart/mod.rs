//! Capability ports over the external charting backend.
//!
//! The overlay engine never talks to a concrete charting library. Everything
//! it needs from one — coordinate conversion, series data, price lines,
//! markers, interaction toggles — goes through [`ChartPort`], so backends stay
//! isolated from order and drag logic.

mod null_port;

pub use null_port::NullChartPort;

use serde::{Deserialize, Serialize};

use crate::core::{Bar, VolumePoint};
use crate::interaction::{CursorStyle, InteractionSettings};
use crate::orders::OrderMarker;

/// RGBA color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }
}

/// Dash pattern for a horizontal price line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Opaque identity of a backend-owned price line.
///
/// Ids are issued by the port and stay stable for the lifetime of the line,
/// which is what lets the registry update lines in place instead of
/// recreating them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceLineId(pub u64);

/// Options applied when creating or restyling a price line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLineOptions {
    pub price: f64,
    pub color: Color,
    pub width_px: f64,
    pub style: LineStyle,
    pub title: String,
}

/// Contract implemented by any charting backend.
///
/// Coordinate conversions return `None` when the requested value is not
/// currently representable (outside the visible scale, scale not built yet).
/// Callers short-circuit on `None`; they never treat it as an error.
pub trait ChartPort {
    fn price_to_coordinate(&self, price: f64) -> Option<f64>;
    fn coordinate_to_price(&self, y_px: f64) -> Option<f64>;

    fn set_bars(&mut self, bars: &[Bar]);
    fn update_bar(&mut self, bar: Bar);
    fn set_volume(&mut self, points: &[VolumePoint]);
    fn update_volume(&mut self, point: VolumePoint);

    fn create_price_line(&mut self, options: PriceLineOptions) -> PriceLineId;
    fn apply_price_line(&mut self, id: PriceLineId, options: PriceLineOptions);
    fn remove_price_line(&mut self, id: PriceLineId);

    /// Replaces the marker set. Markers must arrive sorted by time ascending.
    fn set_markers(&mut self, markers: &[OrderMarker]);

    fn interaction_settings(&self) -> InteractionSettings;
    fn set_interaction_settings(&mut self, settings: InteractionSettings);

    fn set_cursor(&mut self, cursor: CursorStyle);
    fn capture_pointer(&mut self);
    fn release_pointer(&mut self);

    /// Resets the visible range to fit all loaded content.
    fn fit_content(&mut self);
}
