use indexmap::IndexMap;
use smallvec::{SmallVec, smallvec};

use crate::chart::{ChartPort, PriceLineId, PriceLineOptions};
use crate::error::OverlayResult;
use crate::orders::{
    Order, OrderChange, OrderChangeBus, OrderChangeKind, OrderId, OrderMarker, OrderPatch,
    OrderSpec, OrderStyle, marker_for,
};

/// Backend line handles owned by one order.
///
/// Handles are created with the order (or lazily, when `sl`/`tp` first
/// appear) and destroyed with it. Updates restyle the existing line so its
/// backend identity stays stable across the order's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderHandles {
    pub entry: PriceLineId,
    pub sl: Option<PriceLineId>,
    pub tp: Option<PriceLineId>,
}

#[derive(Debug)]
struct OrderEntry {
    order: Order,
    handles: OrderHandles,
}

/// Owns the live order set, the derived markers, and the backend handles.
///
/// All mutation goes through `place_order` / `update_order` / `cancel_order`;
/// the drag controller writes through this API and never touches records
/// directly.
#[derive(Debug)]
pub struct OrderRegistry {
    next_id: u64,
    orders: IndexMap<OrderId, OrderEntry>,
    markers: Vec<OrderMarker>,
    style: OrderStyle,
}

impl OrderRegistry {
    pub fn new(style: OrderStyle) -> OverlayResult<Self> {
        Ok(Self {
            next_id: 0,
            orders: IndexMap::new(),
            markers: Vec::new(),
            style: style.validate()?,
        })
    }

    /// Creates an order with its marker, entry line, and any supplied
    /// stop-loss/take-profit lines.
    pub fn place_order<C: ChartPort>(
        &mut self,
        port: &mut C,
        spec: OrderSpec,
    ) -> OverlayResult<OrderId> {
        spec.validate()?;

        let id = OrderId(self.next_id);
        self.next_id += 1;

        let order = Order {
            id,
            time: spec.time,
            price: spec.price,
            side: spec.side,
            sl: spec.sl,
            tp: spec.tp,
            label: spec.label,
        };

        let handles = OrderHandles {
            entry: port.create_price_line(entry_line_options(&order, self.style)),
            sl: order
                .sl
                .map(|price| port.create_price_line(sl_line_options(price, self.style))),
            tp: order
                .tp
                .map(|price| port.create_price_line(tp_line_options(price, self.style))),
        };

        self.markers.push(marker_for(&order, self.style));
        sync_markers(&mut self.markers, port);
        self.orders.insert(id, OrderEntry { order, handles });
        Ok(id)
    }

    /// Applies a partial update. Returns `false` for an unknown id.
    ///
    /// Every recognized field that gets applied is reported through the bus in
    /// one notification; a patch that applies nothing notifies nobody.
    pub fn update_order<C: ChartPort>(
        &mut self,
        port: &mut C,
        bus: &mut OrderChangeBus,
        id: OrderId,
        patch: OrderPatch,
    ) -> bool {
        let style = self.style;
        let Some(entry) = self.orders.get_mut(&id) else {
            return false;
        };

        let mut changed: SmallVec<[OrderChangeKind; 4]> = SmallVec::new();

        if let Some(price) = patch.price.filter(|price| price.is_finite()) {
            entry.order.price = price;
            changed.push(OrderChangeKind::Price);
        }
        if let Some(sl) = patch.sl.filter(|price| price.is_finite()) {
            entry.order.sl = Some(sl);
            changed.push(OrderChangeKind::StopLoss);
        }
        if let Some(tp) = patch.tp.filter(|price| price.is_finite()) {
            entry.order.tp = Some(tp);
            changed.push(OrderChangeKind::TakeProfit);
        }
        if let Some(time) = patch.time {
            entry.order.time = time;
            changed.push(OrderChangeKind::Time);
        }
        if let Some(side) = patch.side {
            entry.order.side = side;
            changed.push(OrderChangeKind::Side);
        }
        if let Some(label) = patch.label {
            entry.order.label = Some(label);
            changed.push(OrderChangeKind::Label);
        }

        if changed.is_empty() {
            return true;
        }

        let restyle_entry_line = changed.iter().any(|kind| {
            matches!(
                kind,
                OrderChangeKind::Price | OrderChangeKind::Side | OrderChangeKind::Label
            )
        });
        if restyle_entry_line {
            port.apply_price_line(entry.handles.entry, entry_line_options(&entry.order, style));
        }

        if changed.contains(&OrderChangeKind::StopLoss) {
            if let Some(price) = entry.order.sl {
                let options = sl_line_options(price, style);
                match entry.handles.sl {
                    Some(line) => port.apply_price_line(line, options),
                    None => entry.handles.sl = Some(port.create_price_line(options)),
                }
            }
        }
        if changed.contains(&OrderChangeKind::TakeProfit) {
            if let Some(price) = entry.order.tp {
                let options = tp_line_options(price, style);
                match entry.handles.tp {
                    Some(line) => port.apply_price_line(line, options),
                    None => entry.handles.tp = Some(port.create_price_line(options)),
                }
            }
        }

        let refresh_marker = changed.iter().any(|kind| {
            matches!(
                kind,
                OrderChangeKind::Time | OrderChangeKind::Side | OrderChangeKind::Label
            )
        });
        if refresh_marker {
            let marker = marker_for(&entry.order, style);
            if let Some(existing) = self.markers.iter_mut().find(|m| m.order_id == id) {
                *existing = marker;
            }
            sync_markers(&mut self.markers, port);
        }

        bus.notify(&OrderChange { id, changed });
        true
    }

    /// Destroys the order and every handle it owns. Returns `false` for an
    /// unknown id.
    pub fn cancel_order<C: ChartPort>(
        &mut self,
        port: &mut C,
        bus: &mut OrderChangeBus,
        id: OrderId,
    ) -> bool {
        let Some(entry) = self.orders.shift_remove(&id) else {
            return false;
        };

        port.remove_price_line(entry.handles.entry);
        if let Some(line) = entry.handles.sl {
            port.remove_price_line(line);
        }
        if let Some(line) = entry.handles.tp {
            port.remove_price_line(line);
        }

        self.markers.retain(|marker| marker.order_id != id);
        sync_markers(&mut self.markers, port);

        bus.notify(&OrderChange {
            id,
            changed: smallvec![OrderChangeKind::Cancel],
        });
        true
    }

    /// Orders in placement (insertion) order, not time order.
    #[must_use]
    pub fn list_orders(&self) -> Vec<Order> {
        self.orders.values().map(|entry| entry.order.clone()).collect()
    }

    #[must_use]
    pub fn get_order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id).map(|entry| &entry.order)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.values().map(|entry| &entry.order)
    }

    #[must_use]
    pub fn handles(&self, id: OrderId) -> Option<OrderHandles> {
        self.orders.get(&id).map(|entry| entry.handles)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    #[must_use]
    pub fn style(&self) -> OrderStyle {
        self.style
    }
}

/// Re-sorts the marker collection by time and pushes it wholesale.
///
/// The backend contract requires markers submitted in time order.
fn sync_markers<C: ChartPort>(markers: &mut [OrderMarker], port: &mut C) {
    markers.sort_by_key(|marker| (marker.time, marker.order_id));
    port.set_markers(markers);
}

fn entry_line_options(order: &Order, style: OrderStyle) -> PriceLineOptions {
    PriceLineOptions {
        price: order.price,
        color: style.side_color(order.side),
        width_px: style.entry_width_px,
        style: style.entry_style,
        title: order
            .label
            .clone()
            .unwrap_or_else(|| order.side.title().to_owned()),
    }
}

fn sl_line_options(price: f64, style: OrderStyle) -> PriceLineOptions {
    PriceLineOptions {
        price,
        color: style.sl_color,
        width_px: style.exit_width_px,
        style: style.exit_style,
        title: "SL".to_owned(),
    }
}

fn tp_line_options(price: f64, style: OrderStyle) -> PriceLineOptions {
    PriceLineOptions {
        price,
        color: style.tp_color,
        width_px: style.exit_width_px,
        style: style.exit_style,
        title: "TP".to_owned(),
    }
}
