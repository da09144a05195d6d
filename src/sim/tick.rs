//! Session driver
//!
//! Owns the bus and every component, and advances them once per fixed step
//! in dependency order: Input -> Difficulty -> Path -> Body -> Items.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use glam::Vec2;

use super::body::Body;
use super::difficulty::Controller;
use super::events::{EventBus, GameEvent, Sender, attach};
use super::items::ItemSpawner;
use super::path::PathGenerator;
use super::state::{GamePhase, Terrain};
use crate::error::SimError;
use crate::tuning::Tuning;

/// Lateral speed of the autopilot (units per second)
const AUTOPILOT_LATERAL_SPEED: f32 = 12.0;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Lateral delta from the input collaborator (world X; Y unused)
    pub lateral: Option<Vec2>,
    /// StartGame button
    pub start: bool,
    /// ReplayGame button
    pub replay: bool,
    /// Steer toward the next segment automatically (demo/headless runs)
    pub autopilot: bool,
}

pub struct Session {
    bus: EventBus,
    controller: Rc<RefCell<Controller>>,
    path: Rc<RefCell<PathGenerator>>,
    body: Rc<RefCell<Body>>,
    items: Rc<RefCell<ItemSpawner>>,
    time_ticks: u64,
}

impl Session {
    /// Validate `tuning` and wire every component to a fresh bus
    pub fn new(tuning: Tuning, seed: u64) -> Result<Self, SimError> {
        tuning.validate()?;
        let tuning = Rc::new(tuning);

        let bus = EventBus::new();
        let controller = Rc::new(RefCell::new(Controller::new(Rc::clone(&tuning))));
        let path = Rc::new(RefCell::new(PathGenerator::new(Rc::clone(&tuning), seed)));
        let body = Rc::new(RefCell::new(Body::new(Rc::clone(&tuning))));
        let items = Rc::new(RefCell::new(ItemSpawner::new(
            Rc::clone(&tuning),
            seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        )));

        attach(&controller, &bus);
        attach(&path, &bus);
        attach(&body, &bus);
        attach(&items, &bus);

        Ok(Self {
            bus,
            controller,
            path,
            body,
            items,
            time_ticks: 0,
        })
    }

    /// The session's bus, for collaborators outside the core
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn start_game(&self) -> Result<(), SimError> {
        let outbox = self
            .controller
            .try_borrow_mut()
            .map_err(|_| SimError::ComponentBusy("controller"))?
            .start_game()?;
        self.bus.publish_all(Sender::Controller, outbox);
        Ok(())
    }

    pub fn replay_game(&self) -> Result<(), SimError> {
        let outbox = self
            .controller
            .try_borrow_mut()
            .map_err(|_| SimError::ComponentBusy("controller"))?
            .replay_game()?;
        self.bus.publish_all(Sender::Controller, outbox);
        Ok(())
    }

    /// Advance the whole session by `dt` seconds
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        self.time_ticks += 1;

        if input.start {
            if let Err(e) = self.start_game() {
                log::warn!("Start ignored: {e}");
            }
        }
        if input.replay {
            if let Err(e) = self.replay_game() {
                log::warn!("Replay ignored: {e}");
            }
        }

        let lateral = if input.autopilot {
            self.autopilot_delta(dt)
        } else {
            input.lateral
        };
        if let Some(delta) = lateral {
            self.bus.publish(Sender::Input, GameEvent::UserInput(delta));
        }

        let outbox = self.controller.borrow_mut().tick(dt);
        self.bus.publish_all(Sender::Controller, outbox);

        let outbox = self.path.borrow_mut().tick(dt);
        self.bus.publish_all(Sender::Path, outbox);

        let outbox = {
            let path = self.path.borrow();
            self.body.borrow_mut().tick(dt, &*path)
        };
        self.bus.publish_all(Sender::Body, outbox);

        let ball = {
            let body = self.body.borrow();
            (!body.is_dead() && body.is_visible()).then(|| (body.position(), body.radius()))
        };
        let outbox = {
            let path = self.path.borrow();
            self.items.borrow_mut().tick(&*path, ball)
        };
        self.bus.publish_all(Sender::Items, outbox);
    }

    /// Lateral nudge toward the segment the ball is heading for
    fn autopilot_delta(&self, dt: f32) -> Option<Vec2> {
        let path = self.path.borrow();
        let body = self.body.borrow();
        if body.is_dead() || body.is_kinematic() {
            return None;
        }
        let target = match body.last_landed() {
            Some(anchor) => path
                .segment(anchor.segment)
                .filter(|s| s.anchor() == anchor)
                .and_then(|s| s.next)
                .and_then(|id| path.segment(id)),
            None => path.pool().oldest().and_then(|id| path.segment(id)),
        }?;

        let max_step = AUTOPILOT_LATERAL_SPEED * dt;
        let dx = (target.pos.x - body.position().x).clamp(-max_step, max_step);
        (dx != 0.0).then(|| Vec2::new(dx, 0.0))
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn phase(&self) -> GamePhase {
        self.controller.borrow().phase()
    }

    pub fn score(&self) -> u32 {
        self.controller.borrow().score()
    }

    pub fn speed(&self) -> f32 {
        self.controller.borrow().speed()
    }

    pub fn item_probability(&self) -> f32 {
        self.controller.borrow().item_probability()
    }

    /// Score of the last finished run
    pub fn final_score(&self) -> Option<u32> {
        self.controller.borrow().final_score()
    }

    pub fn body(&self) -> Ref<'_, Body> {
        self.body.borrow()
    }

    pub fn path(&self) -> Ref<'_, PathGenerator> {
        self.path.borrow()
    }

    pub fn items(&self) -> Ref<'_, ItemSpawner> {
        self.items.borrow()
    }
}
