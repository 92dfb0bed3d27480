use indexmap::IndexMap;

use crate::chart::{ChartPort, PriceLineId, PriceLineOptions};
use crate::core::{Bar, VolumePoint};
use crate::interaction::{CursorStyle, InteractionSettings};
use crate::orders::OrderMarker;

/// Backend double used by tests and headless engine usage.
///
/// It records every call so suites can assert on the exact traffic crossing
/// the port, and exposes a linear price↔pixel mapping (inverted Y axis, like
/// a real price pane) so hit-testing and drag conversion work end to end
/// without a rendering backend.
#[derive(Debug)]
pub struct NullChartPort {
    price_min: f64,
    price_max: f64,
    height_px: f64,
    next_line_id: u64,

    pub bars: Vec<Bar>,
    pub volume: Vec<VolumePoint>,
    pub last_bar_update: Option<Bar>,
    pub last_volume_update: Option<VolumePoint>,

    pub price_lines: IndexMap<PriceLineId, PriceLineOptions>,
    pub created_line_count: usize,
    pub removed_line_ids: Vec<PriceLineId>,

    pub markers: Vec<OrderMarker>,
    pub set_markers_calls: usize,

    pub settings: InteractionSettings,
    pub cursor: CursorStyle,
    pub pointer_captured: bool,
    pub fit_content_calls: usize,
}

impl Default for NullChartPort {
    fn default() -> Self {
        Self::with_price_domain(0.0, 1.0, 100.0)
    }
}

impl NullChartPort {
    /// Builds a port whose pane maps `price_max` to pixel 0 and `price_min`
    /// to pixel `height_px`.
    #[must_use]
    pub fn with_price_domain(price_min: f64, price_max: f64, height_px: f64) -> Self {
        Self {
            price_min,
            price_max,
            height_px,
            next_line_id: 0,
            bars: Vec::new(),
            volume: Vec::new(),
            last_bar_update: None,
            last_volume_update: None,
            price_lines: IndexMap::new(),
            created_line_count: 0,
            removed_line_ids: Vec::new(),
            markers: Vec::new(),
            set_markers_calls: 0,
            settings: InteractionSettings::default(),
            cursor: CursorStyle::Default,
            pointer_captured: false,
            fit_content_calls: 0,
        }
    }

    fn domain_span(&self) -> Option<f64> {
        let span = self.price_max - self.price_min;
        (span.is_finite() && span > 0.0 && self.height_px > 0.0).then_some(span)
    }
}

impl ChartPort for NullChartPort {
    fn price_to_coordinate(&self, price: f64) -> Option<f64> {
        if !price.is_finite() {
            return None;
        }
        let span = self.domain_span()?;
        Some((self.price_max - price) / span * self.height_px)
    }

    fn coordinate_to_price(&self, y_px: f64) -> Option<f64> {
        if !y_px.is_finite() {
            return None;
        }
        let span = self.domain_span()?;
        Some(self.price_max - y_px / self.height_px * span)
    }

    fn set_bars(&mut self, bars: &[Bar]) {
        self.bars = bars.to_vec();
    }

    fn update_bar(&mut self, bar: Bar) {
        self.last_bar_update = Some(bar);
        match self.bars.last_mut() {
            Some(last) if last.time == bar.time => *last = bar,
            _ => self.bars.push(bar),
        }
    }

    fn set_volume(&mut self, points: &[VolumePoint]) {
        self.volume = points.to_vec();
    }

    fn update_volume(&mut self, point: VolumePoint) {
        self.last_volume_update = Some(point);
        match self.volume.last_mut() {
            Some(last) if last.time == point.time => *last = point,
            _ => self.volume.push(point),
        }
    }

    fn create_price_line(&mut self, options: PriceLineOptions) -> PriceLineId {
        let id = PriceLineId(self.next_line_id);
        self.next_line_id += 1;
        self.created_line_count += 1;
        self.price_lines.insert(id, options);
        id
    }

    fn apply_price_line(&mut self, id: PriceLineId, options: PriceLineOptions) {
        if let Some(existing) = self.price_lines.get_mut(&id) {
            *existing = options;
        }
    }

    fn remove_price_line(&mut self, id: PriceLineId) {
        self.price_lines.shift_remove(&id);
        self.removed_line_ids.push(id);
    }

    fn set_markers(&mut self, markers: &[OrderMarker]) {
        self.markers = markers.to_vec();
        self.set_markers_calls += 1;
    }

    fn interaction_settings(&self) -> InteractionSettings {
        self.settings
    }

    fn set_interaction_settings(&mut self, settings: InteractionSettings) {
        self.settings = settings;
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        self.cursor = cursor;
    }

    fn capture_pointer(&mut self) {
        self.pointer_captured = true;
    }

    fn release_pointer(&mut self) {
        self.pointer_captured = false;
    }

    fn fit_content(&mut self) {
        self.fit_content_calls += 1;
    }
}
