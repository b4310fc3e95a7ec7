//! Two-channel notification bus owned by one waterfall container.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;
use waterfall_core::Token;

/// The two independent channels of a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Someone wants the layout recomputed
    Requested,
    /// A reflow pass finished
    Completed,
}

/// Handle returned by [`SignalBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    channel: Channel,
    id: u64,
}

impl Subscription {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

type Handler = Rc<dyn Fn(&Token)>;

/// Notification bus with a "reflow requested" and a "reflow completed" channel.
///
/// Emission calls the listeners registered at the moment `emit` starts, so
/// handlers may emit, subscribe or unsubscribe re-entrantly. A listener
/// removed during an emission still receives that emission.
#[derive(Default)]
pub struct SignalBus {
    requested: RefCell<IndexMap<u64, Handler>>,
    completed: RefCell<IndexMap<u64, Handler>>,
    next_id: Cell<u64>,
}

impl fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBus")
            .field("requested", &self.requested.borrow().len())
            .field("completed", &self.completed.borrow().len())
            .finish()
    }
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn listeners(&self, channel: Channel) -> &RefCell<IndexMap<u64, Handler>> {
        match channel {
            Channel::Requested => &self.requested,
            Channel::Completed => &self.completed,
        }
    }

    /// Register `handler` on `channel`.
    pub fn subscribe(&self, channel: Channel, handler: impl Fn(&Token) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners(channel).borrow_mut().insert(id, Rc::new(handler));
        Subscription { channel, id }
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.listeners(subscription.channel)
            .borrow_mut()
            .shift_remove(&subscription.id)
            .is_some()
    }

    pub fn emit(&self, channel: Channel, token: &Token) {
        let handlers: Vec<Handler> = self.listeners(channel).borrow().values().cloned().collect();
        trace!(?channel, %token, listeners = handlers.len(), "emit");
        for handler in handlers {
            handler(token);
        }
    }

    /// Publish on [`Channel::Requested`].
    pub fn request(&self, token: &Token) {
        self.emit(Channel::Requested, token);
    }

    /// Publish on [`Channel::Completed`].
    pub fn complete(&self, token: &Token) {
        self.emit(Channel::Completed, token);
    }

    pub fn listener_count(&self, channel: Channel) -> usize {
        self.listeners(channel).borrow().len()
    }
}
