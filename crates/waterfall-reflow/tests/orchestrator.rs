//! End-to-end reflow scenarios driven through the signal bus.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use waterfall_core::{ConfigError, Element, LayoutConfig, ReflowError, Size, Token};
use waterfall_layout::{Block, BlockRegistry};
use waterfall_reflow::{Channel, Orchestrator, OrchestratorOptions, ReflowState, SignalBus};

/// A node with a settable size and a class list.
#[derive(Debug, Default)]
struct FakeNode {
    size: Cell<Option<Size>>,
    classes: RefCell<Vec<String>>,
}

impl FakeNode {
    fn sized(width: f64, height: f64) -> Rc<Self> {
        let node = Rc::new(Self::default());
        node.size.set(Some(Size::new(width, height)));
        node
    }

    fn detached() -> Rc<Self> {
        Rc::new(Self::default())
    }
}

impl Element for FakeNode {
    fn attr(&self, name: &str) -> Option<String> {
        (name == "class").then(|| self.classes.borrow().join(" "))
    }

    fn add_class(&self, class: &str) {
        self.classes.borrow_mut().push(class.to_string());
    }

    fn remove_class(&self, class: &str) {
        self.classes.borrow_mut().retain(|c| c != class);
    }
}

type Node = Rc<FakeNode>;
type Registry = Rc<RefCell<BlockRegistry<Node>>>;

fn measure_node(node: &Node) -> Option<Size> {
    node.size.get()
}

fn container() -> (Rc<SignalBus>, Registry) {
    (Rc::new(SignalBus::new()), Rc::new(RefCell::new(BlockRegistry::new())))
}

fn add(registry: &Registry, order: i64, node: &Node) {
    registry
        .borrow_mut()
        .register(Block::new(order, node.clone()).with_move_class("moving"))
        .unwrap();
}

fn completions(bus: &SignalBus) -> Rc<RefCell<Vec<String>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    bus.subscribe(Channel::Completed, move |t| sink.borrow_mut().push(t.to_string()));
    seen
}

fn rect_of(registry: &Registry, order: i64) -> Option<(f64, f64)> {
    registry
        .borrow()
        .get(order)
        .and_then(|b| b.rect.as_ref().map(|r| (r.left, r.top)))
}

const VIEW: Size = Size {
    width: 200.0,
    height: 600.0,
};

#[test]
fn two_column_scenario_through_the_bus() {
    let (bus, registry) = container();
    for (order, height) in [(0, 100.0), (1, 50.0), (2, 80.0)] {
        add(&registry, order, &FakeNode::sized(100.0, height));
    }
    let orchestrator = Orchestrator::new(bus.clone(), registry.clone(), measure_node);
    let done = completions(&bus);

    assert_eq!(orchestrator.state(), ReflowState::Idle);
    orchestrator.request_reflow("initial");
    assert_eq!(orchestrator.state(), ReflowState::Scheduled);

    let report = orchestrator.flush(&LayoutConfig::columns(2), VIEW).unwrap();

    assert_eq!(report.runs(), 1);
    assert_eq!(report.total_extent(), Some(130.0));
    assert_eq!(orchestrator.total_extent(), 130.0);
    assert_eq!(*done.borrow(), vec!["initial"]);
    assert_eq!(orchestrator.state(), ReflowState::Idle);

    assert_eq!(rect_of(&registry, 0), Some((0.0, 0.0)));
    assert_eq!(rect_of(&registry, 1), Some((100.0, 0.0)));
    assert_eq!(rect_of(&registry, 2), Some((100.0, 50.0)));
}

#[test]
fn flush_without_request_does_nothing() {
    let (bus, registry) = container();
    add(&registry, 0, &FakeNode::sized(100.0, 10.0));
    let orchestrator = Orchestrator::new(bus.clone(), registry.clone(), measure_node);
    let done = completions(&bus);

    let report = orchestrator.flush(&LayoutConfig::columns(2), VIEW).unwrap();
    assert_eq!(report.runs(), 0);
    assert!(done.borrow().is_empty());
    assert_eq!(rect_of(&registry, 0), None);
}

#[test]
fn requests_before_flush_coalesce_into_one_pass() {
    let (bus, registry) = container();
    add(&registry, 0, &FakeNode::sized(100.0, 10.0));
    let orchestrator = Orchestrator::new(bus.clone(), registry.clone(), measure_node);
    let done = completions(&bus);

    for i in 0..4 {
        orchestrator.request_reflow(format!("r{i}"));
    }
    let report = orchestrator.flush(&LayoutConfig::columns(2), VIEW).unwrap();

    assert_eq!(report.runs(), 1);
    assert_eq!(*done.borrow(), vec!["r3"]);
}

#[test]
fn requests_while_running_trigger_exactly_one_more_pass() {
    let (bus, registry) = container();
    add(&registry, 0, &FakeNode::sized(100.0, 10.0));
    add(&registry, 1, &FakeNode::sized(100.0, 20.0));

    let calls = Rc::new(Cell::new(0));
    let observed_state = Rc::new(Cell::new(None));
    let measure = {
        let bus = bus.clone();
        let calls = calls.clone();
        move |node: &Node| {
            if calls.get() == 0 {
                for i in 0..5 {
                    bus.request(&Token(format!("burst-{i}")));
                }
            }
            calls.set(calls.get() + 1);
            node.size.get()
        }
    };
    let orchestrator = Orchestrator::new(bus.clone(), registry.clone(), measure);
    {
        let state = observed_state.clone();
        let registry = registry.clone();
        bus.subscribe(Channel::Requested, move |_| {
            // Requests during the pass see the registry unborrowed
            state.set(Some(registry.try_borrow_mut().is_ok()));
        });
    }
    let done = completions(&bus);

    orchestrator.request_reflow("initial");
    let report = orchestrator.flush(&LayoutConfig::columns(2), VIEW).unwrap();

    assert_eq!(report.runs(), 2);
    assert_eq!(*done.borrow(), vec!["initial", "burst-4"]);
    let tokens: Vec<_> = report.tokens().map(Token::as_str).collect();
    assert_eq!(tokens, vec!["initial", "burst-4"]);
    // Two blocks measured per pass
    assert_eq!(calls.get(), 4);
    assert_eq!(observed_state.get(), Some(true));
    assert_eq!(orchestrator.state(), ReflowState::Idle);
}

#[test]
fn completion_listener_requests_are_bounded_per_flush() {
    let (bus, registry) = container();
    add(&registry, 0, &FakeNode::sized(100.0, 10.0));
    let options = OrchestratorOptions::default().with_max_passes_per_flush(3);
    let orchestrator =
        Orchestrator::with_options(bus.clone(), registry.clone(), measure_node, options);
    {
        let requester = bus.clone();
        bus.subscribe(Channel::Completed, move |t| {
            requester.request(&Token(format!("{t}+")));
        });
    }

    orchestrator.request_reflow("loop");
    let report = orchestrator.flush(&LayoutConfig::columns(2), VIEW).unwrap();

    assert_eq!(report.runs(), 3);
    let tokens: Vec<_> = report.tokens().map(Token::as_str).collect();
    assert_eq!(tokens, vec!["loop", "loop+", "loop++"]);
    assert_eq!(orchestrator.state(), ReflowState::Scheduled);
}

#[test]
fn unregister_mid_pass_keeps_other_placements() {
    let (bus, registry) = container();
    let trigger = FakeNode::sized(100.0, 100.0);
    add(&registry, 0, &trigger);
    add(&registry, 1, &FakeNode::sized(100.0, 50.0));
    add(&registry, 2, &FakeNode::sized(100.0, 80.0));

    let measure = {
        let registry = registry.clone();
        let trigger = trigger.clone();
        move |node: &Node| {
            if Rc::ptr_eq(node, &trigger) {
                registry.borrow_mut().unregister(1);
            }
            node.size.get()
        }
    };
    let orchestrator = Orchestrator::new(bus.clone(), registry.clone(), measure);

    orchestrator.request_reflow("t");
    let report = orchestrator.flush(&LayoutConfig::columns(2), VIEW).unwrap();

    assert_eq!(report.passes[0].placed, 2);
    assert_eq!(rect_of(&registry, 0), Some((0.0, 0.0)));
    assert_eq!(rect_of(&registry, 1), None);
    assert_eq!(rect_of(&registry, 2), Some((100.0, 50.0)));
    assert_eq!(registry.borrow().len(), 2);
}

#[test]
fn configuration_error_aborts_without_writing() {
    let (bus, registry) = container();
    add(&registry, 0, &FakeNode::sized(100.0, 40.0));
    add(&registry, 1, &FakeNode::sized(100.0, 60.0));
    let orchestrator = Orchestrator::new(bus.clone(), registry.clone(), measure_node);
    let done = completions(&bus);

    orchestrator.request_reflow("good");
    orchestrator.flush(&LayoutConfig::columns(2), VIEW).unwrap();
    let before = (rect_of(&registry, 0), rect_of(&registry, 1));

    orchestrator.request_reflow("bad");
    let err = orchestrator
        .flush(&LayoutConfig::columns(0), VIEW)
        .unwrap_err();

    assert_eq!(
        err,
        ReflowError::Config(ConfigError::InvalidLineCount { line_count: 0 })
    );
    assert_eq!(orchestrator.state(), ReflowState::Idle);
    assert_eq!((rect_of(&registry, 0), rect_of(&registry, 1)), before);
    assert_eq!(*done.borrow(), vec!["good"]);

    // Too many tracks for the container is also a configuration error
    orchestrator.request_reflow("narrow");
    let err = orchestrator
        .flush(&LayoutConfig::columns(4).with_gutter(70.0), VIEW)
        .unwrap_err();
    assert!(matches!(
        err,
        ReflowError::Config(ConfigError::NonPositiveTrackSize { .. })
    ));
}

#[test]
fn unmeasured_blocks_are_placed_once_measurement_arrives() {
    let (bus, registry) = container();
    let late = FakeNode::detached();
    add(&registry, 0, &FakeNode::sized(100.0, 40.0));
    add(&registry, 1, &late);
    let orchestrator = Orchestrator::new(bus.clone(), registry.clone(), measure_node);
    let config = LayoutConfig::columns(2);

    orchestrator.request_reflow("first");
    let report = orchestrator.flush(&config, VIEW).unwrap();
    assert_eq!(report.passes[0].skipped, vec![1]);
    assert_eq!(rect_of(&registry, 1), None);

    late.size.set(Some(Size::new(100.0, 30.0)));
    orchestrator.request_reflow("second");
    orchestrator.flush(&config, VIEW).unwrap();
    assert_eq!(rect_of(&registry, 1), Some((100.0, 0.0)));
    assert_eq!(registry.borrow().get(1).unwrap().height, 30.0);
}

#[test]
fn move_class_follows_position_changes() {
    let (bus, registry) = container();
    let a = FakeNode::sized(100.0, 100.0);
    let b = FakeNode::sized(100.0, 50.0);
    add(&registry, 0, &a);
    add(&registry, 1, &b);
    let orchestrator = Orchestrator::new(bus.clone(), registry.clone(), measure_node);
    let config = LayoutConfig::columns(2);

    orchestrator.request_reflow("place");
    orchestrator.flush(&config, VIEW).unwrap();
    assert!(!a.has_class("moving"));
    assert!(!b.has_class("moving"));

    // Halving the container moves both blocks
    orchestrator.request_reflow("resize");
    let report = orchestrator
        .flush(&config, Size::new(100.0, 600.0))
        .unwrap();
    assert_eq!(report.passes[0].moved, vec![0, 1]);
    assert!(a.has_class("moving"));
    assert!(b.has_class("moving"));

    // Only b grows; a keeps its position and loses the marker
    b.size.set(Some(Size::new(100.0, 70.0)));
    orchestrator.request_reflow("grow");
    orchestrator.flush(&config, Size::new(100.0, 600.0)).unwrap();
    assert!(!a.has_class("moving"));
    assert!(b.has_class("moving"));
    assert_eq!(b.classes.borrow().len(), 1);

    orchestrator.settle();
    assert!(!b.has_class("moving"));
}

#[test]
fn register_and_unregister_request_reflows() {
    let (bus, registry) = container();
    let orchestrator = Orchestrator::new(bus.clone(), registry.clone(), measure_node);
    let done = completions(&bus);

    orchestrator
        .register(Block::new(0, FakeNode::sized(100.0, 10.0)))
        .unwrap();
    orchestrator
        .register(Block::new(1, FakeNode::sized(100.0, 10.0)))
        .unwrap();
    assert!(orchestrator
        .register(Block::new(1, FakeNode::sized(100.0, 10.0)))
        .is_err());

    orchestrator.flush(&LayoutConfig::columns(2), VIEW).unwrap();
    assert_eq!(*done.borrow(), vec!["mount:1"]);

    assert!(orchestrator.unregister(0).is_some());
    assert!(orchestrator.unregister(0).is_none());
    orchestrator.flush(&LayoutConfig::columns(2), VIEW).unwrap();
    assert_eq!(*done.borrow(), vec!["mount:1", "unmount:0"]);
    assert_eq!(rect_of(&registry, 1), Some((0.0, 0.0)));
}

#[test]
fn horizontal_rows_use_container_height() {
    let (bus, registry) = container();
    add(&registry, 0, &FakeNode::sized(120.0, 10.0));
    add(&registry, 1, &FakeNode::sized(60.0, 10.0));
    add(&registry, 2, &FakeNode::sized(30.0, 10.0));
    let orchestrator = Orchestrator::new(bus.clone(), registry.clone(), measure_node);

    orchestrator.request_reflow("rows");
    let report = orchestrator
        .flush(&LayoutConfig::rows(2), Size::new(1000.0, 100.0))
        .unwrap();

    assert_eq!(report.total_extent(), Some(120.0));
    assert_eq!(rect_of(&registry, 1), Some((0.0, 50.0)));
    assert_eq!(rect_of(&registry, 2), Some((60.0, 50.0)));
}

#[test]
fn dropping_the_orchestrator_detaches_from_the_bus() {
    let (bus, registry) = container();
    let orchestrator = Orchestrator::new(bus.clone(), registry, measure_node);
    assert_eq!(bus.listener_count(Channel::Requested), 1);
    drop(orchestrator);
    assert_eq!(bus.listener_count(Channel::Requested), 0);
    bus.request(&Token::from("after-drop"));
}

fn host_sized(_: &Node) -> Option<Size> {
    None
}

#[test]
fn pushed_sizes_drive_layout_when_nothing_is_measured() {
    let (bus, registry) = container();
    for order in 0..3 {
        add(&registry, order, &FakeNode::detached());
    }
    let orchestrator = Orchestrator::new(bus.clone(), registry.clone(), host_sized);
    let requested = Rc::new(RefCell::new(Vec::new()));
    let sink = requested.clone();
    bus.subscribe(Channel::Requested, move |t| sink.borrow_mut().push(t.to_string()));

    assert!(orchestrator.update_size(0, Size::new(100.0, 90.0)));
    assert!(orchestrator.update_size(1, Size::new(100.0, 50.0)));
    assert!(orchestrator.update_size(2, Size::new(100.0, 30.0)));
    assert_eq!(*requested.borrow(), vec!["resize:0", "resize:1", "resize:2"]);
    assert_eq!(orchestrator.state(), ReflowState::Scheduled);

    let report = orchestrator.flush(&LayoutConfig::columns(2), VIEW).unwrap();
    assert_eq!(report.runs(), 1);
    assert_eq!(report.tokens().next(), Some(&Token::from("resize:2")));
    assert_eq!(report.total_extent(), Some(90.0));
    assert_eq!(registry.borrow().get(0).unwrap().height, 90.0);
    assert_eq!(rect_of(&registry, 2), Some((100.0, 50.0)));

    // Same size again: stored, nothing to reflow.
    assert!(orchestrator.update_size(0, Size::new(100.0, 90.0)));
    assert_eq!(requested.borrow().len(), 3);
    assert_eq!(orchestrator.state(), ReflowState::Idle);

    assert!(!orchestrator.update_size(7, Size::new(10.0, 10.0)));
    assert_eq!(requested.borrow().len(), 3);
}

#[test]
fn measured_size_replaces_pushed_size() {
    let (bus, registry) = container();
    add(&registry, 0, &FakeNode::sized(100.0, 40.0));
    let orchestrator = Orchestrator::new(bus, registry.clone(), measure_node);

    orchestrator.update_size(0, Size::new(100.0, 90.0));
    let report = orchestrator.flush(&LayoutConfig::columns(2), VIEW).unwrap();

    assert_eq!(report.total_extent(), Some(40.0));
    assert_eq!(registry.borrow().get(0).unwrap().height, 40.0);
}
