use std::cell::RefCell;
use std::rc::Rc;

use chart_orders::orders::{OrderChange, OrderChangeBus, OrderChangeKind, OrderId};
use smallvec::smallvec;

fn change(id: u64) -> OrderChange {
    OrderChange {
        id: OrderId(id),
        changed: smallvec![OrderChangeKind::Price],
    }
}

#[test]
fn fan_out_runs_in_subscription_order() {
    let mut bus = OrderChangeBus::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    for name in ["first", "second", "third"] {
        let sink = log.clone();
        bus.subscribe(move |_| sink.borrow_mut().push(name));
    }

    bus.notify(&change(0));
    assert_eq!(log.borrow().as_slice(), ["first", "second", "third"]);
}

#[test]
fn unsubscribe_removes_exactly_one_listener() {
    let mut bus = OrderChangeBus::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let keep_sink = log.clone();
    bus.subscribe(move |_| keep_sink.borrow_mut().push("keep"));
    let drop_sink = log.clone();
    let dropped = bus.subscribe(move |_| drop_sink.borrow_mut().push("drop"));

    assert!(bus.unsubscribe(dropped));
    assert!(!bus.unsubscribe(dropped));
    assert_eq!(bus.subscriber_count(), 1);

    bus.notify(&change(0));
    assert_eq!(log.borrow().as_slice(), ["keep"]);
}

#[test]
fn panicking_subscriber_does_not_starve_later_ones() {
    let mut bus = OrderChangeBus::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    bus.subscribe(|_| panic!("misbehaving listener"));
    let sink = log.clone();
    bus.subscribe(move |change| sink.borrow_mut().push(change.id));

    bus.notify(&change(3));
    bus.notify(&change(4));

    assert_eq!(log.borrow().as_slice(), [OrderId(3), OrderId(4)]);
}

#[test]
fn subscribers_observe_the_reported_change_set() {
    let mut bus = OrderChangeBus::new();
    let seen = Rc::new(RefCell::new(None));

    let sink = seen.clone();
    bus.subscribe(move |change| *sink.borrow_mut() = Some(change.clone()));

    let reported = OrderChange {
        id: OrderId(9),
        changed: smallvec![OrderChangeKind::StopLoss, OrderChangeKind::TakeProfit],
    };
    bus.notify(&reported);

    assert_eq!(seen.borrow().as_ref(), Some(&reported));
}
