use approx::assert_relative_eq;
use chart_orders::chart::NullChartPort;
use chart_orders::interaction::{
    CursorStyle, DragConfig, DragController, DragState, DragTarget, InteractionSettings,
};
use chart_orders::orders::{OrderChangeBus, OrderRegistry, OrderSide, OrderSpec, OrderStyle};

// Pane maps price 110 -> 0 px and price 90 -> 200 px, so 1 price unit = 10 px.
fn port() -> NullChartPort {
    NullChartPort::with_price_domain(90.0, 110.0, 200.0)
}

fn setup() -> (NullChartPort, OrderRegistry, OrderChangeBus, DragController) {
    let mut port = port();
    let mut registry = OrderRegistry::new(OrderStyle::default()).expect("registry init");
    registry
        .place_order(
            &mut port,
            OrderSpec::new(1_000, 100.0, OrderSide::Buy).with_sl(95.0).with_tp(108.0),
        )
        .expect("place order");
    let controller = DragController::new(DragConfig::default()).expect("controller init");
    (port, registry, OrderChangeBus::new(), controller)
}

#[test]
fn invalid_hit_threshold_is_rejected() {
    let config = DragConfig {
        hit_threshold_px: 0.0,
    };
    assert!(DragController::new(config).is_err());
}

#[test]
fn pointer_down_outside_threshold_stays_idle_without_freezing() {
    let (mut port, registry, _bus, mut controller) = setup();
    let before = port.settings;

    // sl line sits at 150 px; 7 px away is outside the 6 px default threshold.
    controller.pointer_down(&mut port, &registry, 157.0);

    assert_eq!(controller.state(), DragState::Idle);
    assert_eq!(port.settings, before);
    assert!(!port.pointer_captured);
    assert_eq!(port.cursor, CursorStyle::Default);
}

#[test]
fn pointer_down_within_threshold_starts_drag_and_freezes_viewport() {
    let (mut port, registry, _bus, mut controller) = setup();
    port.settings = InteractionSettings {
        scale_pinch: false,
        ..InteractionSettings::default()
    };
    let before = port.settings;

    controller.pointer_down(&mut port, &registry, 154.0);

    let DragState::Dragging { order_id, target } = controller.state() else {
        panic!("expected dragging state");
    };
    assert_eq!(target, DragTarget::StopLoss);
    assert_eq!(registry.get_order(order_id).expect("order").sl, Some(95.0));
    assert_eq!(port.settings, InteractionSettings::all_disabled());
    assert!(port.pointer_captured);
    assert_eq!(port.cursor, CursorStyle::Grabbing);
    assert_ne!(port.settings, before);
}

#[test]
fn closest_handle_wins_the_hit_test() {
    let (mut port, registry, _bus, mut controller) = setup();

    // tp line at 20 px, sl line at 150 px; 24 px is within threshold of tp only.
    controller.pointer_down(&mut port, &registry, 24.0);

    let DragState::Dragging { target, .. } = controller.state() else {
        panic!("expected dragging state");
    };
    assert_eq!(target, DragTarget::TakeProfit);
}

#[test]
fn idle_pointer_move_updates_cursor_affordance_only() {
    let (mut port, mut registry, mut bus, mut controller) = setup();

    controller.pointer_move(&mut port, &mut registry, &mut bus, 151.0);
    assert_eq!(port.cursor, CursorStyle::Grab);
    assert_eq!(controller.state(), DragState::Idle);

    controller.pointer_move(&mut port, &mut registry, &mut bus, 60.0);
    assert_eq!(port.cursor, CursorStyle::Default);
}

#[test]
fn dragging_pointer_move_writes_price_through_registry() {
    let (mut port, mut registry, mut bus, mut controller) = setup();

    let changes = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = changes.clone();
    bus.subscribe(move |change| sink.borrow_mut().push(change.clone()));

    controller.pointer_down(&mut port, &registry, 150.0);
    // 140 px converts back to price 96.
    controller.pointer_move(&mut port, &mut registry, &mut bus, 140.0);

    let order = registry.list_orders().pop().expect("order");
    assert_relative_eq!(order.sl.expect("sl"), 96.0);
    assert_eq!(changes.borrow().len(), 1);
}

#[test]
fn snap_function_quantizes_dragged_price() {
    let (mut port, mut registry, mut bus, mut controller) = setup();
    controller.set_snap(Some(Box::new(|price: f64| (price * 2.0).round() / 2.0)));

    controller.pointer_down(&mut port, &registry, 150.0);
    // 143 px converts to price 95.7, snapped to the nearest 0.5 tick.
    controller.pointer_move(&mut port, &mut registry, &mut bus, 143.0);

    let order = registry.list_orders().pop().expect("order");
    assert_relative_eq!(order.sl.expect("sl"), 95.5);
}

#[test]
fn pointer_up_restores_exact_prefreeze_settings() {
    let (mut port, mut registry, mut bus, mut controller) = setup();
    let custom = InteractionSettings {
        handle_scale: false,
        scroll_mouse_wheel: false,
        ..InteractionSettings::default()
    };
    port.settings = custom;

    controller.pointer_down(&mut port, &registry, 150.0);
    controller.pointer_move(&mut port, &mut registry, &mut bus, 140.0);
    controller.pointer_up(&mut port);

    assert_eq!(controller.state(), DragState::Idle);
    assert_eq!(port.settings, custom);
    assert!(!port.pointer_captured);
    assert_eq!(port.cursor, CursorStyle::Default);
}

#[test]
fn pointer_leave_resolves_the_session_like_pointer_up() {
    let (mut port, registry, _bus, mut controller) = setup();
    let before = port.settings;

    controller.pointer_down(&mut port, &registry, 150.0);
    controller.pointer_leave(&mut port);

    assert_eq!(controller.state(), DragState::Idle);
    assert_eq!(port.settings, before);
    assert!(!port.pointer_captured);
}

#[test]
fn finishing_while_idle_is_a_no_op() {
    let (mut port, _registry, _bus, mut controller) = setup();
    port.cursor = CursorStyle::Grab;

    controller.pointer_up(&mut port);
    controller.pointer_leave(&mut port);

    // No session existed, so the controller did not touch the port.
    assert_eq!(port.cursor, CursorStyle::Grab);
    assert_eq!(controller.state(), DragState::Idle);
}

#[test]
fn unrepresentable_conversion_is_ignored_mid_drag() {
    let (mut port, mut registry, mut bus, mut controller) = setup();

    let changes = std::rc::Rc::new(std::cell::Cell::new(0_usize));
    let sink = changes.clone();
    bus.subscribe(move |_| sink.set(sink.get() + 1));

    controller.pointer_down(&mut port, &registry, 150.0);
    controller.pointer_move(&mut port, &mut registry, &mut bus, f64::NAN);

    assert!(controller.is_dragging());
    let order = registry.list_orders().pop().expect("order");
    assert_eq!(order.sl, Some(95.0));
    assert_eq!(changes.get(), 0);
}

#[test]
fn entry_lines_are_never_draggable() {
    let mut port = port();
    let mut registry = OrderRegistry::new(OrderStyle::default()).expect("registry init");
    registry
        .place_order(&mut port, OrderSpec::new(1, 100.0, OrderSide::Buy))
        .expect("order without sl/tp");
    let mut controller = DragController::new(DragConfig::default()).expect("controller init");

    // Entry line sits at 100 px; pointer-down right on it must not start a drag.
    controller.pointer_down(&mut port, &registry, 100.0);
    assert_eq!(controller.state(), DragState::Idle);
    assert!(!port.pointer_captured);
}
