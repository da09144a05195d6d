//! Game flow, score and difficulty
//!
//! Owns the session phase and the tunables other components follow (speed,
//! item probability, gravity). Start and replay are two-step sequences driven
//! by a [`Timer`]:
//!
//! - StartGame: Initialize now, GameStart after `start_delay`
//! - ReplayGame: Reset now, Initialize after `reset_delay`, GameStart after
//!   a further `start_delay`

use std::rc::Rc;

use super::events::{Component, GameEvent, Outbox, Sender, Topic};
use super::schedule::{Deferred, Timer};
use super::state::GamePhase;
use crate::error::SimError;
use crate::tuning::Tuning;

pub struct Controller {
    tuning: Rc<Tuning>,
    phase: GamePhase,
    score: u32,
    speed: f32,
    item_probability: f32,
    timer: Timer,
    replay_in_flight: bool,
    final_score: Option<u32>,
}

impl Controller {
    pub fn new(tuning: Rc<Tuning>) -> Self {
        Self {
            phase: GamePhase::Idle,
            score: 0,
            speed: tuning.base_speed,
            item_probability: tuning.item_probability_for(tuning.base_speed),
            timer: Timer::new(),
            replay_in_flight: false,
            final_score: None,
            tuning,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn item_probability(&self) -> f32 {
        self.item_probability
    }

    /// Score of the last finished run, for the best-score collaborator
    pub fn final_score(&self) -> Option<u32> {
        self.final_score
    }

    pub fn pending(&self) -> Option<Deferred> {
        self.timer.pending()
    }

    /// Begin the Initialize -> GameStart sequence. Calling again before
    /// GameStart restarts the sequence.
    pub fn start_game(&mut self) -> Result<Outbox, SimError> {
        if self.phase != GamePhase::Idle {
            return Err(SimError::InvalidTransition {
                action: "start game",
                phase: self.phase,
            });
        }
        self.replay_in_flight = false;
        Ok(self.initialize())
    }

    /// Begin the Reset -> Initialize -> GameStart sequence. Calling again
    /// while it is in flight restarts it.
    pub fn replay_game(&mut self) -> Result<Outbox, SimError> {
        if self.phase != GamePhase::GameOver && !self.replay_in_flight {
            return Err(SimError::InvalidTransition {
                action: "replay game",
                phase: self.phase,
            });
        }
        log::info!("Replay requested");
        self.phase = GamePhase::Idle;
        self.replay_in_flight = true;
        self.timer.schedule(self.tuning.reset_delay, Deferred::Reinitialize);
        Ok(vec![GameEvent::Reset(true)])
    }

    /// Advance the lifecycle timer
    pub fn tick(&mut self, dt: f32) -> Outbox {
        match self.timer.poll(dt) {
            Some(Deferred::Reinitialize) => self.initialize(),
            Some(Deferred::BeginPlay) => {
                self.phase = GamePhase::Playing;
                self.replay_in_flight = false;
                log::info!("Game started at speed {}", self.speed);
                vec![GameEvent::GameStart(true)]
            }
            None => Outbox::new(),
        }
    }

    fn initialize(&mut self) -> Outbox {
        self.score = 0;
        self.speed = self.tuning.base_speed;
        // Derived from speed; the path only starts rolling after the first step
        self.item_probability = self.tuning.item_probability_for(self.speed);
        self.final_score = None;
        self.timer.schedule(self.tuning.start_delay, Deferred::BeginPlay);
        log::info!("Initializing session");
        vec![
            GameEvent::SpeedChanged(self.speed),
            GameEvent::GravityChanged(self.tuning.normal_gravity),
            GameEvent::Initialize(true),
            GameEvent::ScoreChanged(0),
        ]
    }

    fn add_points(&mut self, points: u32, outbox: &mut Outbox) {
        self.score = self.score.saturating_add(points);
        outbox.push(GameEvent::ScoreChanged(self.score));
    }

    /// Step the speed up on every multiple of the interval until the cap
    fn evaluate_difficulty(&mut self, outbox: &mut Outbox) {
        let t = &self.tuning;
        if self.score % t.difficulty_interval != 0 || self.speed >= t.max_speed {
            return;
        }
        self.speed = (self.speed + 1.0).min(t.max_speed);
        self.item_probability = t.item_probability_for(self.speed);
        log::info!(
            "Difficulty up at score {}: speed {}, item probability {:.3}",
            self.score,
            self.speed,
            self.item_probability
        );
        outbox.push(GameEvent::SpeedChanged(self.speed));
        outbox.push(GameEvent::UpdateItemSpawnProb(self.item_probability));
    }
}

impl Component for Controller {
    const NAME: &'static str = "controller";
    const SENDER: Sender = Sender::Controller;
    const TOPICS: &'static [Topic] = &[Topic::UpdateScore, Topic::CollectItem, Topic::GameOver];

    fn on_event(&mut self, event: &GameEvent) -> Result<Outbox, SimError> {
        let mut outbox = Outbox::new();
        if self.phase != GamePhase::Playing {
            return Ok(outbox);
        }
        match *event {
            GameEvent::UpdateScore(_) => {
                self.add_points(self.tuning.score_increment, &mut outbox);
                self.evaluate_difficulty(&mut outbox);
            }
            GameEvent::CollectItem(value) => self.add_points(value, &mut outbox),
            GameEvent::GameOver(_) => {
                self.phase = GamePhase::GameOver;
                self.final_score = Some(self.score);
                self.timer.cancel();
                log::info!("Game over, final score {}", self.score);
                outbox.push(GameEvent::GravityChanged(self.tuning.game_over_gravity));
            }
            _ => {}
        }
        Ok(outbox)
    }
}
