//! The ball: gravity, landings, hops and falling out of the world
//!
//! The ball never moves in Z; the path scrolls underneath it. Each landing
//! solves for the vertical launch velocity that puts the ball on the next
//! segment's surface when that segment arrives.

use std::rc::Rc;

use glam::Vec3;

use super::collision::{Landing, find_landing};
use super::events::{Component, GameEvent, Outbox, Sender, Topic};
use super::state::{Anchor, Terrain};
use super::trajectory::launch_velocity;
use crate::error::SimError;
use crate::tuning::Tuning;

#[derive(Debug, Clone)]
pub struct Body {
    tuning: Rc<Tuning>,
    pos: Vec3,
    vel: Vec3,
    /// Frozen: no gravity, no input
    kinematic: bool,
    dead: bool,
    visible: bool,
    speed: f32,
    gravity: f32,
    /// Segment activation the ball last landed on
    last_landed: Option<Anchor>,
    /// Hop off `last_landed` to solve at the start of the next step, after
    /// any speed change caused by this landing has been delivered
    hop_pending: bool,
    /// Landed segment that had no successor, already reported
    stranded: Option<Anchor>,
}

impl Body {
    pub fn new(tuning: Rc<Tuning>) -> Self {
        Self {
            pos: Vec3::new(0.0, tuning.ball_start_height, 0.0),
            vel: Vec3::ZERO,
            kinematic: true,
            dead: false,
            visible: false,
            speed: tuning.base_speed,
            gravity: tuning.normal_gravity,
            last_landed: None,
            hop_pending: false,
            stranded: None,
            tuning,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.pos
    }

    pub fn velocity(&self) -> Vec3 {
        self.vel
    }

    pub fn radius(&self) -> f32 {
        self.tuning.ball_radius
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_kinematic(&self) -> bool {
        self.kinematic
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn last_landed(&self) -> Option<Anchor> {
        self.last_landed
    }

    /// Integrate one step against the active path
    pub fn tick(&mut self, dt: f32, terrain: &dyn Terrain) -> Outbox {
        let mut outbox = Outbox::new();
        if self.kinematic {
            return outbox;
        }

        if std::mem::take(&mut self.hop_pending) {
            self.hop(terrain);
        }

        let prev_y = self.pos.y;
        self.vel.y -= self.gravity * dt;
        self.pos += self.vel * dt;

        if !self.dead && self.vel.y <= 0.0 {
            if let Some(landing) = find_landing(
                terrain,
                prev_y,
                self.pos,
                self.tuning.ball_radius,
                self.tuning.segment_half_width,
            ) {
                self.land(landing, terrain, &mut outbox);
            }
        }

        if !self.dead && self.pos.y < self.tuning.death_height {
            self.dead = true;
            log::info!("Ball fell out at x={:.2}", self.pos.x);
            outbox.push(GameEvent::GameOver(true));
        }

        if self.dead && self.pos.y < self.tuning.freeze_depth {
            self.kinematic = true;
            self.visible = false;
            self.vel = Vec3::ZERO;
        }

        outbox
    }

    fn land(&mut self, landing: Landing, terrain: &dyn Terrain, outbox: &mut Outbox) {
        self.pos.y = landing.rest_y;
        self.vel.y = 0.0;

        let Some(anchor) = terrain.segment(landing.segment).map(|s| s.anchor()) else {
            return;
        };
        match self.last_landed {
            Some(last) if last != anchor => outbox.push(GameEvent::UpdateScore(true)),
            _ => {}
        }
        self.last_landed = Some(anchor);
        self.hop_pending = true;
    }

    /// Launch from the last landed segment toward its successor
    fn hop(&mut self, terrain: &dyn Terrain) {
        let Some(segment) = self
            .last_landed
            .and_then(|a| terrain.segment(a.segment).filter(|s| s.anchor() == a))
        else {
            log::warn!("Landed segment was recycled before the hop");
            return;
        };
        let Some(next) = segment.next.and_then(|id| terrain.segment(id)) else {
            // Resting re-lands every step; report once
            let anchor = segment.anchor();
            if self.stranded != Some(anchor) {
                log::warn!("Landed on segment {:?} with no successor, hop skipped", segment.id);
                self.stranded = Some(anchor);
            }
            return;
        };
        self.stranded = None;

        let distance = next.pos.z - self.pos.z;
        let height = next.pos.y - segment.pos.y;
        match launch_velocity(distance, height, self.speed, self.gravity) {
            Ok(v) => self.vel.y = v.y,
            Err(e) => log::warn!("Hop to {:?} skipped: {e}", next.id),
        }
    }

    fn apply_input(&mut self, delta_x: f32) {
        if self.kinematic || self.dead {
            return;
        }
        let limit = self.tuning.lateral_limit;
        self.pos.x = (self.pos.x + delta_x).clamp(-limit, limit);
    }

    fn respawn(&mut self) {
        self.pos = Vec3::new(0.0, self.tuning.ball_start_height, 0.0);
        self.vel = Vec3::ZERO;
        self.kinematic = true;
        self.dead = false;
        self.visible = true;
        self.last_landed = None;
        self.hop_pending = false;
        self.stranded = None;
    }
}

impl Component for Body {
    const NAME: &'static str = "body";
    const SENDER: Sender = Sender::Body;
    const TOPICS: &'static [Topic] = &[
        Topic::Initialize,
        Topic::GameStart,
        Topic::Reset,
        Topic::UserInput,
        Topic::SpeedChanged,
        Topic::GravityChanged,
    ];

    fn on_event(&mut self, event: &GameEvent) -> Result<Outbox, SimError> {
        match *event {
            GameEvent::Initialize(_) => self.respawn(),
            GameEvent::GameStart(_) => self.kinematic = false,
            GameEvent::Reset(_) => {
                self.kinematic = true;
                self.visible = false;
                self.vel = Vec3::ZERO;
                self.hop_pending = false;
            }
            GameEvent::UserInput(delta) => self.apply_input(delta.x),
            GameEvent::SpeedChanged(speed) => self.speed = speed,
            GameEvent::GravityChanged(g) => self.gravity = g,
            _ => {}
        }
        Ok(Outbox::new())
    }
}
