//! Single-slot deferred action timer
//!
//! Holds at most one pending action with a due time on the session clock.
//! Scheduling replaces whatever was pending.

/// A deferred continuation of the start/replay sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Publish Initialize, then schedule `BeginPlay`
    Reinitialize,
    /// Publish GameStart
    BeginPlay,
}

#[derive(Debug, Clone, Default)]
pub struct Timer {
    /// Seconds since the timer was created
    clock: f64,
    pending: Option<(f64, Deferred)>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay` seconds, cancelling any pending action
    pub fn schedule(&mut self, delay: f32, action: Deferred) {
        if let Some((_, old)) = self.pending {
            log::debug!("Superseding pending {old:?} with {action:?}");
        }
        self.pending = Some((self.clock + f64::from(delay.max(0.0)), action));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<Deferred> {
        self.pending.map(|(_, a)| a)
    }

    /// Advance the clock; returns the action if it fell due.
    ///
    /// At most one action fires per call.
    pub fn poll(&mut self, dt: f32) -> Option<Deferred> {
        self.clock += f64::from(dt);
        match self.pending {
            Some((due, action)) if self.clock >= due => {
                self.pending = None;
                Some(action)
            }
            _ => None,
        }
    }
}
