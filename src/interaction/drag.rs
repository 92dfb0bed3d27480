use ordered_float::OrderedFloat;

use crate::chart::ChartPort;
use crate::error::OverlayResult;
use crate::interaction::{CursorStyle, DragConfig, DragState, DragTarget, InteractionSettings};
use crate::orders::{OrderChangeBus, OrderId, OrderPatch, OrderRegistry};

/// Optional price quantizer applied while dragging (e.g. round to tick size).
pub type SnapFn = Box<dyn Fn(f64) -> f64>;

/// Pointer-driven editing of stop-loss/take-profit handles.
///
/// The controller is a two-state machine (`Idle` ⇄ `Dragging`) fed by the
/// host's pointer events. While a drag is in flight the chart's pan/zoom
/// interactions are frozen; the settings active before the freeze are restored
/// on every exit path, including pointer-leave.
pub struct DragController {
    config: DragConfig,
    state: DragState,
    snap: Option<SnapFn>,
    /// Interaction settings captured before the freeze. `Some` means frozen.
    saved_settings: Option<InteractionSettings>,
}

impl DragController {
    pub fn new(config: DragConfig) -> OverlayResult<Self> {
        Ok(Self {
            config: config.validate()?,
            state: DragState::Idle,
            snap: None,
            saved_settings: None,
        })
    }

    #[must_use]
    pub fn state(&self) -> DragState {
        self.state
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    #[must_use]
    pub fn config(&self) -> DragConfig {
        self.config
    }

    pub fn set_snap(&mut self, snap: Option<SnapFn>) {
        self.snap = snap;
    }

    /// Idle: updates the cursor affordance over draggable handles.
    /// Dragging: converts the pointer to a price and writes it through the
    /// registry (lazily creating the line on first write).
    pub fn pointer_move<C: ChartPort>(
        &mut self,
        port: &mut C,
        registry: &mut OrderRegistry,
        bus: &mut OrderChangeBus,
        y_px: f64,
    ) {
        match self.state {
            DragState::Idle => {
                let cursor = if self.hit_test(port, registry, y_px).is_some() {
                    CursorStyle::Grab
                } else {
                    CursorStyle::Default
                };
                port.set_cursor(cursor);
            }
            DragState::Dragging { order_id, target } => {
                // Unrepresentable coordinates are ignored outright.
                let Some(price) = port.coordinate_to_price(y_px) else {
                    return;
                };
                if !price.is_finite() {
                    return;
                }
                let price = self.snap.as_ref().map_or(price, |snap| snap(price));
                let patch = match target {
                    DragTarget::StopLoss => OrderPatch::sl(price),
                    DragTarget::TakeProfit => OrderPatch::tp(price),
                };
                registry.update_order(port, bus, order_id, patch);
            }
        }
    }

    /// Starts a drag when the pointer lands within the hit threshold of a
    /// stop-loss/take-profit line. A miss leaves the controller Idle so
    /// ordinary chart interaction proceeds.
    pub fn pointer_down<C: ChartPort>(
        &mut self,
        port: &mut C,
        registry: &OrderRegistry,
        y_px: f64,
    ) {
        if self.is_dragging() {
            return;
        }
        let Some((order_id, target)) = self.hit_test(port, registry, y_px) else {
            return;
        };

        self.state = DragState::Dragging { order_id, target };
        port.set_cursor(CursorStyle::Grabbing);
        port.capture_pointer();
        self.freeze(port);
    }

    pub fn pointer_up<C: ChartPort>(&mut self, port: &mut C) {
        self.finish(port);
    }

    pub fn pointer_leave<C: ChartPort>(&mut self, port: &mut C) {
        self.finish(port);
    }

    /// Unconditionally resolves the session. Idempotent: a second call with no
    /// active session does nothing.
    fn finish<C: ChartPort>(&mut self, port: &mut C) {
        if !self.is_dragging() && self.saved_settings.is_none() {
            return;
        }
        port.release_pointer();
        port.set_cursor(CursorStyle::Default);
        self.unfreeze(port);
        self.state = DragState::Idle;
    }

    /// Captures the active interaction settings once, then disables them all.
    ///
    /// Re-entering while frozen is a no-op, so the restore always reinstates
    /// the configuration from before the first freeze.
    fn freeze<C: ChartPort>(&mut self, port: &mut C) {
        if self.saved_settings.is_some() {
            return;
        }
        self.saved_settings = Some(port.interaction_settings());
        port.set_interaction_settings(InteractionSettings::all_disabled());
    }

    fn unfreeze<C: ChartPort>(&mut self, port: &mut C) {
        if let Some(saved) = self.saved_settings.take() {
            port.set_interaction_settings(saved);
        }
    }

    /// Closest stop-loss/take-profit line within the vertical hit threshold.
    ///
    /// Entry lines are not draggable. Handles whose price has no current
    /// pixel coordinate are skipped.
    fn hit_test<C: ChartPort>(
        &self,
        port: &C,
        registry: &OrderRegistry,
        y_px: f64,
    ) -> Option<(OrderId, DragTarget)> {
        let mut best: Option<(OrderedFloat<f64>, OrderId, DragTarget)> = None;

        for order in registry.iter() {
            let handles = [
                (DragTarget::StopLoss, order.sl),
                (DragTarget::TakeProfit, order.tp),
            ];
            for (target, price) in handles {
                let Some(price) = price else { continue };
                let Some(line_y) = port.price_to_coordinate(price) else {
                    continue;
                };
                if !line_y.is_finite() {
                    continue;
                }
                let distance = OrderedFloat((line_y - y_px).abs());
                if *distance > self.config.hit_threshold_px {
                    continue;
                }
                if best.is_none_or(|(best_distance, _, _)| distance < best_distance) {
                    best = Some((distance, order.id, target));
                }
            }
        }

        best.map(|(_, order_id, target)| (order_id, target))
    }
}

impl std::fmt::Debug for DragController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragController")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("snap", &self.snap.is_some())
            .field("frozen", &self.saved_settings.is_some())
            .finish()
    }
}
