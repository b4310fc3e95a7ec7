//! Coalescing reflow scheduler for one waterfall container.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, debug_span, trace, warn};
use waterfall_core::element::{add_class, remove_class};
use waterfall_core::{Element, LayoutConfig, ReflowError, RegistryError, Size, Token};
use waterfall_layout::{allocate, Block, BlockPatch, BlockRegistry};

use crate::bus::{Channel, SignalBus, Subscription};
use crate::measure::Measure;

/// Scheduling state of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReflowState {
    /// Nothing to do
    #[default]
    Idle,
    /// A request is waiting for the next [`Orchestrator::flush`]
    Scheduled,
    /// A pass is executing
    Running,
}

/// Pending work, shared with the bus listener.
#[derive(Debug, Default)]
struct Schedule {
    state: ReflowState,
    /// Latest token requested since the last pass started
    pending: Option<Token>,
}

impl Schedule {
    fn request(&mut self, token: Token) {
        match self.state {
            ReflowState::Idle => {
                self.state = ReflowState::Scheduled;
            }
            ReflowState::Scheduled | ReflowState::Running => {
                if let Some(previous) = &self.pending {
                    trace!(%previous, %token, "coalescing reflow request");
                }
            }
        }
        self.pending = Some(token);
    }

    fn begin(&mut self) -> Option<Token> {
        if self.state != ReflowState::Scheduled {
            return None;
        }
        let token = self.pending.take()?;
        self.state = ReflowState::Running;
        Some(token)
    }

    fn finish(&mut self) {
        self.state = if self.pending.is_some() {
            ReflowState::Scheduled
        } else {
            ReflowState::Idle
        };
    }

    fn abort(&mut self) {
        self.state = ReflowState::Idle;
        self.pending = None;
    }
}

/// Tuning for [`Orchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    max_passes_per_flush: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            max_passes_per_flush: 8,
        }
    }
}

impl OrchestratorOptions {
    /// Upper bound on passes run by a single `flush`, at least one. Work
    /// left over stays scheduled for the next one.
    pub fn with_max_passes_per_flush(mut self, max: usize) -> Self {
        self.max_passes_per_flush = max.max(1);
        self
    }

    pub fn max_passes_per_flush(&self) -> usize {
        self.max_passes_per_flush
    }
}

/// Outcome of one reflow pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    /// Token published on completion of this pass
    pub token: Token,
    /// Blocks that received a placement
    pub placed: usize,
    /// Blocks skipped for lack of a measurement
    pub skipped: Vec<i64>,
    /// Previously placed blocks whose geometry changed
    pub moved: Vec<i64>,
    /// Overall height (vertical tracks) or width (horizontal tracks)
    pub total_extent: f64,
}

/// Passes run by one [`Orchestrator::flush`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlushReport {
    pub passes: Vec<PassReport>,
}

impl FlushReport {
    pub fn runs(&self) -> usize {
        self.passes.len()
    }

    /// Extent computed by the last pass, if any ran.
    pub fn total_extent(&self) -> Option<f64> {
        self.passes.last().map(|p| p.total_extent)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.passes.iter().map(|p| &p.token)
    }
}

/// Runs reflow passes for one container in response to bus requests.
///
/// The orchestrator listens on [`Channel::Requested`]. A request while idle
/// schedules a pass; requests while scheduled or running replace the
/// pending token, so any burst of requests during a pass costs exactly one
/// extra pass. The host drives execution by calling [`flush`](Self::flush)
/// once per tick.
///
/// Each pass publishes one [`Channel::Completed`] signal with the latest
/// token of the requests it absorbed. Requesters racing each other must not
/// expect a completion per request.
pub struct Orchestrator<N, M> {
    registry: Rc<RefCell<BlockRegistry<N>>>,
    bus: Rc<SignalBus>,
    measure: M,
    schedule: Rc<RefCell<Schedule>>,
    subscription: Subscription,
    options: OrchestratorOptions,
    total_extent: Cell<f64>,
}

impl<N, M> Orchestrator<N, M>
where
    N: Element + Clone,
    M: Measure<N>,
{
    pub fn new(bus: Rc<SignalBus>, registry: Rc<RefCell<BlockRegistry<N>>>, measure: M) -> Self {
        Self::with_options(bus, registry, measure, OrchestratorOptions::default())
    }

    pub fn with_options(
        bus: Rc<SignalBus>,
        registry: Rc<RefCell<BlockRegistry<N>>>,
        measure: M,
        options: OrchestratorOptions,
    ) -> Self {
        let schedule = Rc::new(RefCell::new(Schedule::default()));
        let listener: Weak<RefCell<Schedule>> = Rc::downgrade(&schedule);
        let subscription = bus.subscribe(Channel::Requested, move |token| {
            if let Some(schedule) = listener.upgrade() {
                schedule.borrow_mut().request(token.clone());
            }
        });

        Self {
            registry,
            bus,
            measure,
            schedule,
            subscription,
            options,
            total_extent: Cell::new(0.0),
        }
    }

    pub fn bus(&self) -> &Rc<SignalBus> {
        &self.bus
    }

    pub fn registry(&self) -> &Rc<RefCell<BlockRegistry<N>>> {
        &self.registry
    }

    pub fn state(&self) -> ReflowState {
        self.schedule.borrow().state
    }

    /// Overall extent computed by the last successful pass.
    pub fn total_extent(&self) -> f64 {
        self.total_extent.get()
    }

    /// Ask for a reflow. Completion is observed on [`Channel::Completed`].
    pub fn request_reflow(&self, token: impl Into<Token>) {
        self.bus.request(&token.into());
    }

    /// Register `handler` for completions.
    pub fn on_completed(&self, handler: impl Fn(&Token) + 'static) -> Subscription {
        self.bus.subscribe(Channel::Completed, handler)
    }

    /// Add a block and request a reflow tagged `mount:<order>`.
    pub fn register(&self, block: Block<N>) -> Result<(), RegistryError> {
        let order = block.order;
        self.registry.borrow_mut().register(block)?;
        self.request_reflow(format!("mount:{order}"));
        Ok(())
    }

    /// Remove a block and request a reflow tagged `unmount:<order>`.
    pub fn unregister(&self, order: i64) -> Option<Block<N>> {
        let block = self.registry.borrow_mut().unregister(order)?;
        self.request_reflow(format!("unmount:{order}"));
        Some(block)
    }

    /// Record a size pushed by the host and request a reflow tagged
    /// `resize:<order>` if it differs from the stored one.
    ///
    /// Pushed sizes only survive a pass when the measurement source reports
    /// `None` for the block; a measured size always wins.
    pub fn update_size(&self, order: i64, size: Size) -> bool {
        let changed = {
            let mut registry = self.registry.borrow_mut();
            let Some(current) = registry.get(order).map(|b| b.size()) else {
                return false;
            };
            current != size && registry.update(order, BlockPatch::size(size))
        };
        if changed {
            self.request_reflow(format!("resize:{order}"));
        }
        true
    }

    /// Run the scheduled passes.
    ///
    /// `config` is read fresh for every pass. `container` is the container's
    /// size; the component on the cross axis of `config.line` sizes the
    /// tracks. A configuration error aborts the pass before anything is
    /// written, drops pending requests and returns to idle.
    pub fn flush(&self, config: &LayoutConfig, container: Size) -> Result<FlushReport, ReflowError> {
        let mut report = FlushReport::default();
        loop {
            if report.runs() >= self.options.max_passes_per_flush() {
                if self.state() == ReflowState::Scheduled {
                    warn!(
                        passes = report.runs(),
                        "reflow pass limit reached, deferring remaining work"
                    );
                }
                break;
            }

            let Some(token) = self.schedule.borrow_mut().begin() else {
                break;
            };

            match self.run_pass(&token, config, container) {
                Ok(pass) => {
                    self.schedule.borrow_mut().finish();
                    report.passes.push(pass);
                    self.bus.complete(&token);
                }
                Err(err) => {
                    self.schedule.borrow_mut().abort();
                    warn!(%token, error = %err, "reflow aborted");
                    return Err(err);
                }
            }
        }
        Ok(report)
    }

    fn run_pass(
        &self,
        token: &Token,
        config: &LayoutConfig,
        container: Size,
    ) -> Result<PassReport, ReflowError> {
        let _span = debug_span!("reflow_pass", %token).entered();

        let mut blocks = self.registry.borrow().snapshot();
        let mut measured = Vec::with_capacity(blocks.len());
        for block in &mut blocks {
            if let Some(size) = self.measure.measure(&block.node) {
                block.width = size.width;
                block.height = size.height;
                measured.push((block.order, size));
            }
        }

        let layout = allocate(&blocks, config, config.line.cross(container))?;
        for order in &layout.skipped {
            trace!(order, "block not placed yet");
        }

        {
            let mut registry = self.registry.borrow_mut();
            for (order, size) in measured {
                registry.update(order, BlockPatch::size(size));
            }
        }

        let moved = self.registry.borrow().moved(&layout);
        for block in &blocks {
            if moved.binary_search(&block.order).is_ok() {
                add_class(Some(&block.node), &block.move_class);
            } else if block.rect.is_some() {
                remove_class(Some(&block.node), &block.move_class);
            }
        }

        let placed = self.registry.borrow_mut().commit(&layout);
        self.total_extent.set(layout.total_primary_extent);

        debug!(
            placed,
            skipped = layout.skipped.len(),
            moved = moved.len(),
            total_extent = layout.total_primary_extent,
            "reflow pass complete"
        );

        Ok(PassReport {
            token: token.clone(),
            placed,
            skipped: layout.skipped,
            moved,
            total_extent: layout.total_primary_extent,
        })
    }

    /// Remove the move class from every registered block, typically once the
    /// host's transitions have ended.
    pub fn settle(&self) {
        let nodes: Vec<(N, String)> = self
            .registry
            .borrow()
            .iter()
            .map(|b| (b.node.clone(), b.move_class.clone()))
            .collect();
        for (node, class) in nodes {
            remove_class(Some(&node), &class);
        }
    }
}

impl<N, M> Drop for Orchestrator<N, M> {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription);
    }
}
