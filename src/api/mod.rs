use serde_json::Value;

use crate::chart::ChartPort;
use crate::core::{Bar, NormalizerConfig, VolumePoint, normalize_row, normalize_rows};
use crate::error::OverlayResult;
use crate::interaction::{DragConfig, DragController, DragState, drag::SnapFn};
use crate::orders::{
    Order, OrderChange, OrderChangeBus, OrderId, OrderPatch, OrderRegistry, OrderSpec, OrderStyle,
    SubscriptionId,
};

/// Construction-time tuning for the overlay engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayEngineConfig {
    pub normalizer: NormalizerConfig,
    pub style: OrderStyle,
    pub drag: DragConfig,
}

impl OverlayEngineConfig {
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.normalizer = normalizer;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: OrderStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_drag(mut self, drag: DragConfig) -> Self {
        self.drag = drag;
        self
    }
}

/// Main orchestration facade consumed by host applications.
///
/// `OverlayEngine` coordinates bar normalization, the order registry, the
/// drag controller, and change fan-out, talking to the charting backend only
/// through the [`ChartPort`] capability trait.
pub struct OverlayEngine<C: ChartPort> {
    port: C,
    normalizer: NormalizerConfig,
    registry: OrderRegistry,
    drag: DragController,
    bus: OrderChangeBus,
}

impl<C: ChartPort> OverlayEngine<C> {
    pub fn new(port: C, config: OverlayEngineConfig) -> OverlayResult<Self> {
        Ok(Self {
            port,
            normalizer: config.normalizer,
            registry: OrderRegistry::new(config.style)?,
            drag: DragController::new(config.drag)?,
            bus: OrderChangeBus::new(),
        })
    }

    /// Normalizes a batch of raw rows, canonicalizes it by time, and loads
    /// candles plus the derived volume series. Returns the emitted bar count.
    pub fn set_data(&mut self, rows: &[Value]) -> usize {
        let mut bars = normalize_rows(rows, &self.normalizer);
        canonicalize_bars(&mut bars);

        self.port.set_bars(&bars);
        let volume: Vec<VolumePoint> = bars.iter().filter_map(|bar| bar.volume_point()).collect();
        self.port.set_volume(&volume);
        bars.len()
    }

    /// Normalizes one raw row and applies it as an incremental update.
    ///
    /// Returns the normalized bar, or `None` when the row cannot produce one.
    pub fn update(&mut self, row: &Value) -> Option<Bar> {
        let bar = normalize_row(row, &self.normalizer, 0)?;
        self.port.update_bar(bar);
        if let Some(point) = bar.volume_point() {
            self.port.update_volume(point);
        }
        Some(bar)
    }

    pub fn place_order(&mut self, spec: OrderSpec) -> OverlayResult<OrderId> {
        self.registry.place_order(&mut self.port, spec)
    }

    pub fn update_order(&mut self, id: OrderId, patch: OrderPatch) -> bool {
        self.registry
            .update_order(&mut self.port, &mut self.bus, id, patch)
    }

    pub fn cancel_order(&mut self, id: OrderId) -> bool {
        self.registry.cancel_order(&mut self.port, &mut self.bus, id)
    }

    #[must_use]
    pub fn list_orders(&self) -> Vec<Order> {
        self.registry.list_orders()
    }

    #[must_use]
    pub fn get_order(&self, id: OrderId) -> Option<&Order> {
        self.registry.get_order(id)
    }

    pub fn on_order_change(
        &mut self,
        subscriber: impl FnMut(&OrderChange) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(subscriber)
    }

    pub fn unsubscribe_order_change(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Installs or clears the price quantizer applied while dragging.
    pub fn set_price_snap(&mut self, snap: Option<SnapFn>) {
        self.drag.set_snap(snap);
    }

    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn pointer_down(&mut self, y_px: f64) {
        self.drag.pointer_down(&mut self.port, &self.registry, y_px);
    }

    pub fn pointer_move(&mut self, y_px: f64) {
        self.drag
            .pointer_move(&mut self.port, &mut self.registry, &mut self.bus, y_px);
    }

    pub fn pointer_up(&mut self) {
        self.drag.pointer_up(&mut self.port);
    }

    pub fn pointer_leave(&mut self) {
        self.drag.pointer_leave(&mut self.port);
    }

    /// Pass-through to the backend's fit-to-content reset.
    pub fn reset_view(&mut self) {
        self.port.fit_content();
    }

    #[must_use]
    pub fn port(&self) -> &C {
        &self.port
    }

    #[must_use]
    pub fn into_port(self) -> C {
        self.port
    }
}

/// Sorts by time ascending; duplicate times keep the last sample.
fn canonicalize_bars(bars: &mut Vec<Bar>) {
    bars.sort_by_key(|bar| bar.time);
    bars.dedup_by(|next, kept| {
        if next.time == kept.time {
            *kept = *next;
            true
        } else {
            false
        }
    });
}
