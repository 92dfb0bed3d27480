use std::cell::RefCell;
use std::rc::Rc;

use chart_orders::chart::NullChartPort;
use chart_orders::interaction::DragState;
use chart_orders::orders::{OrderChange, OrderChangeKind, OrderSide, OrderSpec};
use chart_orders::{OverlayEngine, OverlayEngineConfig};
use serde_json::json;

fn engine() -> OverlayEngine<NullChartPort> {
    // Pane maps price 110 -> 0 px and price 90 -> 200 px.
    let port = NullChartPort::with_price_domain(90.0, 110.0, 200.0);
    OverlayEngine::new(port, OverlayEngineConfig::default()).expect("engine init")
}

#[test]
fn set_data_loads_candles_and_derived_volume_sorted_by_time() {
    let mut engine = engine();

    let loaded = engine.set_data(&[
        json!({"time": 2_000, "open": 101.0, "high": 103.0, "low": 100.0, "close": 102.0, "volume": 7.0}),
        json!({"time": 1_000, "open": 100.0, "high": 102.0, "low": 99.0, "close": 101.0, "volume": 5.0}),
        json!({"time": 1_500, "open": "bad", "high": 1.0, "low": 1.0, "close": 1.0}),
    ]);

    assert_eq!(loaded, 2);
    let bars = &engine.port().bars;
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].time, 1_000);
    assert_eq!(bars[1].time, 2_000);

    let volume = &engine.port().volume;
    assert_eq!(volume.len(), 2);
    assert_eq!(volume[0].value, 5.0);
    assert!(volume[0].bullish);
}

#[test]
fn duplicate_times_keep_the_last_sample() {
    let mut engine = engine();

    engine.set_data(&[
        json!({"time": 1_000, "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5}),
        json!({"time": 1_000, "open": 1.1, "high": 2.1, "low": 0.6, "close": 1.6}),
    ]);

    let bars = &engine.port().bars;
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].open, 1.1);
}

#[test]
fn incremental_update_pushes_candle_and_volume() {
    let mut engine = engine();

    let bar = engine
        .update(&json!({"time": 3_000, "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 9.0}))
        .expect("normalized bar");

    assert_eq!(bar.time, 3_000);
    assert_eq!(engine.port().last_bar_update, Some(bar));
    assert_eq!(engine.port().last_volume_update.expect("volume").value, 9.0);

    assert!(engine.update(&json!({"open": "x"})).is_none());
}

#[test]
fn full_order_lifecycle_with_drag_and_cancel() {
    let mut engine = engine();

    let changes: Rc<RefCell<Vec<OrderChange>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = changes.clone();
    engine.on_order_change(move |change| sink.borrow_mut().push(change.clone()));

    let id = engine
        .place_order(
            OrderSpec::new(1_000, 100.0, OrderSide::Buy).with_sl(95.0).with_tp(110.0),
        )
        .expect("place order");

    let orders = engine.list_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].time, 1_000);
    assert_eq!(orders[0].price, 100.0);
    assert_eq!(orders[0].side, OrderSide::Buy);
    assert_eq!(orders[0].sl, Some(95.0));
    assert_eq!(orders[0].tp, Some(110.0));

    // Drag the sl handle (at 150 px) to the pixel for price 96.
    engine.pointer_down(150.0);
    assert!(matches!(engine.drag_state(), DragState::Dragging { .. }));
    engine.pointer_move(140.0);
    engine.pointer_up();

    assert_eq!(engine.drag_state(), DragState::Idle);
    assert_eq!(engine.get_order(id).expect("order").sl, Some(96.0));
    {
        let recorded = changes.borrow();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].changed.as_slice(), [OrderChangeKind::StopLoss]);
    }

    assert!(engine.cancel_order(id));
    assert!(engine.list_orders().is_empty());

    let recorded = changes.borrow();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[1].id, id);
    assert_eq!(recorded[1].changed.as_slice(), [OrderChangeKind::Cancel]);
}

#[test]
fn snap_applies_to_dragged_prices() {
    let mut engine = engine();
    engine.set_price_snap(Some(Box::new(|price: f64| price.round())));

    engine
        .place_order(OrderSpec::new(1, 100.0, OrderSide::Sell).with_tp(95.0))
        .expect("place order");

    // tp line sits at 150 px; 143 px converts to 95.7 and snaps to 96.
    engine.pointer_down(150.0);
    engine.pointer_move(143.0);
    engine.pointer_up();

    let order = engine.list_orders().pop().expect("order");
    assert_eq!(order.tp, Some(96.0));
}

#[test]
fn unsubscribed_listeners_stop_receiving_changes() {
    let mut engine = engine();
    let count = Rc::new(std::cell::Cell::new(0_usize));

    let sink = count.clone();
    let subscription = engine.on_order_change(move |_| sink.set(sink.get() + 1));

    let id = engine
        .place_order(OrderSpec::new(1, 100.0, OrderSide::Buy))
        .expect("place order");
    engine.update_order(id, chart_orders::orders::OrderPatch::sl(95.0));
    assert_eq!(count.get(), 1);

    assert!(engine.unsubscribe_order_change(subscription));
    engine.update_order(id, chart_orders::orders::OrderPatch::sl(94.0));
    assert_eq!(count.get(), 1);
}

#[test]
fn reset_view_passes_through_to_the_backend() {
    let mut engine = engine();
    engine.reset_view();
    assert_eq!(engine.port().fit_content_calls, 1);
}
