//! Typed publish/subscribe hub
//!
//! One bus per session. Dispatch is synchronous and depth-first: `publish`
//! returns only after every handler (and everything those handlers published)
//! has run. Handlers are snapshotted per publish, so subscribing or
//! unsubscribing from inside a handler takes effect on the next publish.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::{Vec2, Vec3};

use super::state::Anchor;
use crate::error::SimError;

/// Stable topic identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Initialize,
    GameStart,
    GameOver,
    Reset,
    UserInput,
    UpdateScore,
    CollectItem,
    UpdateItemSpawnProb,
    ItemSpawnRequest,
    SpeedChanged,
    GravityChanged,
    ScoreChanged,
}

/// An event with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Initialize(bool),
    GameStart(bool),
    GameOver(bool),
    Reset(bool),
    /// Lateral delta in world X (Y unused)
    UserInput(Vec2),
    /// A landing happened
    UpdateScore(bool),
    /// Points from a collected item
    CollectItem(u32),
    UpdateItemSpawnProb(f32),
    ItemSpawnRequest { anchor: Anchor, position: Vec3 },
    SpeedChanged(f32),
    GravityChanged(f32),
    /// Current score after any change
    ScoreChanged(u32),
}

impl GameEvent {
    pub fn topic(&self) -> Topic {
        match self {
            GameEvent::Initialize(_) => Topic::Initialize,
            GameEvent::GameStart(_) => Topic::GameStart,
            GameEvent::GameOver(_) => Topic::GameOver,
            GameEvent::Reset(_) => Topic::Reset,
            GameEvent::UserInput(_) => Topic::UserInput,
            GameEvent::UpdateScore(_) => Topic::UpdateScore,
            GameEvent::CollectItem(_) => Topic::CollectItem,
            GameEvent::UpdateItemSpawnProb(_) => Topic::UpdateItemSpawnProb,
            GameEvent::ItemSpawnRequest { .. } => Topic::ItemSpawnRequest,
            GameEvent::SpeedChanged(_) => Topic::SpeedChanged,
            GameEvent::GravityChanged(_) => Topic::GravityChanged,
            GameEvent::ScoreChanged(_) => Topic::ScoreChanged,
        }
    }
}

/// Who published an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sender {
    Controller,
    Path,
    Body,
    Items,
    Input,
    External,
}

/// Events a component wants published once it has released its own state
pub type Outbox = Vec<GameEvent>;

/// A subscriber callback. Identity is the `Rc` allocation.
pub type Handler = Rc<dyn Fn(&EventBus, Sender, &GameEvent) -> Result<(), SimError>>;

/// Wrap a closure as a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&EventBus, Sender, &GameEvent) -> Result<(), SimError> + 'static,
{
    Rc::new(f)
}

#[inline]
fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

#[derive(Default)]
pub struct EventBus {
    handlers: RefCell<HashMap<Topic, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`. Returns false (and warns) if it is
    /// already registered there.
    pub fn subscribe(&self, topic: Topic, handler: Handler) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let list = handlers.entry(topic).or_default();
        if list.iter().any(|h| same_handler(h, &handler)) {
            log::warn!("Handler already subscribed to {topic:?}, ignoring");
            return false;
        }
        list.push(handler);
        true
    }

    /// Remove `handler` from `topic`. Returns whether it was registered.
    pub fn unsubscribe(&self, topic: Topic, handler: &Handler) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let Some(list) = handlers.get_mut(&topic) else {
            return false;
        };
        let before = list.len();
        list.retain(|h| !same_handler(h, handler));
        before != list.len()
    }

    /// Drop every handler for `topic`
    pub fn clear(&self, topic: Topic) {
        self.handlers.borrow_mut().remove(&topic);
    }

    pub fn handler_count(&self, topic: Topic) -> usize {
        self.handlers.borrow().get(&topic).map_or(0, Vec::len)
    }

    /// Deliver `event` to every handler of its topic in registration order.
    ///
    /// A failing handler is logged and does not stop the remaining ones.
    /// Returns the number of handlers that failed.
    pub fn publish(&self, sender: Sender, event: GameEvent) -> usize {
        let topic = event.topic();
        let snapshot: Vec<Handler> = self
            .handlers
            .borrow()
            .get(&topic)
            .cloned()
            .unwrap_or_default();

        log::trace!("{sender:?} -> {event:?} ({} handlers)", snapshot.len());

        let mut failures = 0;
        for h in &snapshot {
            if let Err(e) = h(self, sender, &event) {
                failures += 1;
                log::error!("Handler for {topic:?} failed: {e}");
            }
        }
        failures
    }

    /// Publish a batch in order
    pub fn publish_all(&self, sender: Sender, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            self.publish(sender, event);
        }
    }
}

/// A simulation component that reacts to bus events.
///
/// Components never publish while borrowed: `on_event` returns an [`Outbox`]
/// that the bus adapter publishes after the borrow is released.
pub trait Component {
    const NAME: &'static str;
    const SENDER: Sender;
    const TOPICS: &'static [Topic];

    fn on_event(&mut self, event: &GameEvent) -> Result<Outbox, SimError>;
}

/// Subscribe `component` to all of its topics. Returns the handler so the
/// caller can unsubscribe later.
pub fn attach<C: Component + 'static>(component: &Rc<RefCell<C>>, bus: &EventBus) -> Handler {
    let target = Rc::clone(component);
    let h = handler(move |bus, _sender, event| {
        let outbox = target
            .try_borrow_mut()
            .map_err(|_| SimError::ComponentBusy(C::NAME))?
            .on_event(event)?;
        bus.publish_all(C::SENDER, outbox);
        Ok(())
    });
    for &topic in C::TOPICS {
        bus.subscribe(topic, Rc::clone(&h));
    }
    h
}
