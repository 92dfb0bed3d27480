pub mod events;
pub mod registry;

pub use events::{OrderChange, OrderChangeBus, OrderChangeKind, SubscriptionId};
pub use registry::{OrderHandles, OrderRegistry};

use serde::{Deserialize, Serialize};

use crate::chart::{Color, LineStyle};
use crate::error::{OverlayError, OverlayResult};

/// Opaque order identity. Monotonically increasing per registry, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

/// One live order annotation.
///
/// `time` and `price` are always valid; `sl` / `tp` may be added or changed at
/// any point in the order's life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub time: i64,
    pub price: f64,
    pub side: OrderSide,
    pub sl: Option<f64>,
    pub tp: Option<f64>,
    pub label: Option<String>,
}

/// Input to `place_order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub time: i64,
    pub price: f64,
    pub side: OrderSide,
    pub sl: Option<f64>,
    pub tp: Option<f64>,
    pub label: Option<String>,
}

impl OrderSpec {
    #[must_use]
    pub fn new(time: i64, price: f64, side: OrderSide) -> Self {
        Self {
            time,
            price,
            side,
            sl: None,
            tp: None,
            label: None,
        }
    }

    #[must_use]
    pub fn with_sl(mut self, sl: f64) -> Self {
        self.sl = Some(sl);
        self
    }

    #[must_use]
    pub fn with_tp(mut self, tp: f64) -> Self {
        self.tp = Some(tp);
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn validate(&self) -> OverlayResult<()> {
        if !self.price.is_finite() {
            return Err(OverlayError::InvalidOrder(
                "order price must be finite".to_owned(),
            ));
        }
        for (value, name) in [(self.sl, "sl"), (self.tp, "tp")] {
            if value.is_some_and(|price| !price.is_finite()) {
                return Err(OverlayError::InvalidOrder(format!(
                    "order `{name}` must be finite when present"
                )));
            }
        }
        Ok(())
    }
}

/// Partial update applied by `update_order`.
///
/// Present fields are applied; absent fields are left untouched. Non-finite
/// prices are ignored rather than applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPatch {
    pub price: Option<f64>,
    pub sl: Option<f64>,
    pub tp: Option<f64>,
    pub time: Option<i64>,
    pub side: Option<OrderSide>,
    pub label: Option<String>,
}

impl OrderPatch {
    #[must_use]
    pub fn sl(price: f64) -> Self {
        Self {
            sl: Some(price),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tp(price: f64) -> Self {
        Self {
            tp: Some(price),
            ..Self::default()
        }
    }
}

/// Vertical anchor of a marker relative to its bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerPosition {
    AboveBar,
    BelowBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerShape {
    ArrowUp,
    ArrowDown,
}

/// Directional marker pushed to the backend alongside the order's price lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderMarker {
    pub order_id: OrderId,
    pub time: i64,
    pub position: MarkerPosition,
    pub shape: MarkerShape,
    pub color: Color,
    pub text: Option<String>,
}

/// Colors and line styling for order handles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderStyle {
    pub buy_color: Color,
    pub sell_color: Color,
    pub sl_color: Color,
    pub tp_color: Color,
    pub entry_width_px: f64,
    pub exit_width_px: f64,
    pub entry_style: LineStyle,
    pub exit_style: LineStyle,
}

impl Default for OrderStyle {
    fn default() -> Self {
        Self {
            buy_color: Color::rgb(0.15, 0.65, 0.40),
            sell_color: Color::rgb(0.85, 0.25, 0.25),
            sl_color: Color::rgb(0.85, 0.45, 0.15),
            tp_color: Color::rgb(0.20, 0.50, 0.85),
            entry_width_px: 2.0,
            exit_width_px: 1.0,
            entry_style: LineStyle::Solid,
            exit_style: LineStyle::Dashed,
        }
    }
}

impl OrderStyle {
    pub fn validate(self) -> OverlayResult<Self> {
        for (value, name) in [
            (self.entry_width_px, "entry_width_px"),
            (self.exit_width_px, "exit_width_px"),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(OverlayError::InvalidConfig(format!(
                    "order style `{name}` must be finite and > 0"
                )));
            }
        }
        Ok(self)
    }

    #[must_use]
    pub fn side_color(self, side: OrderSide) -> Color {
        match side {
            OrderSide::Buy => self.buy_color,
            OrderSide::Sell => self.sell_color,
        }
    }
}

/// Derives marker placement and glyph from direction: buy orders sit below the
/// bar pointing up, sell orders above the bar pointing down.
#[must_use]
pub fn marker_for(order: &Order, style: OrderStyle) -> OrderMarker {
    let (position, shape) = match order.side {
        OrderSide::Buy => (MarkerPosition::BelowBar, MarkerShape::ArrowUp),
        OrderSide::Sell => (MarkerPosition::AboveBar, MarkerShape::ArrowDown),
    };
    OrderMarker {
        order_id: order.id,
        time: order.time,
        position,
        shape,
        color: style.side_color(order.side),
        text: order.label.clone(),
    }
}
