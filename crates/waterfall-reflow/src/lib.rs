//! Reflow orchestration for waterfall layouts.
//!
//! Requesters publish on a [`SignalBus`]; the [`Orchestrator`] coalesces the
//! requests, runs the allocator on the next host tick and publishes one
//! completion per pass carrying the token that pass satisfied.
//!
//! Everything here is single-threaded: state is shared with `Rc`/`RefCell`
//! and a pass runs to completion inside [`Orchestrator::flush`].

mod bus;
mod measure;
mod orchestrator;

pub use bus::{Channel, SignalBus, Subscription};
pub use measure::Measure;
pub use orchestrator::{FlushReport, Orchestrator, OrchestratorOptions, PassReport, ReflowState};
