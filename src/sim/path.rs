//! Endless path generation
//!
//! Keeps a constant number of active segments scrolling toward the camera,
//! recycling the ones that fall behind and placing fresh ones ahead. Lateral
//! and vertical variance grows through two ramps as the run gets longer.

use std::rc::Rc;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::events::{Component, GameEvent, Outbox, Sender, Topic};
use super::pool::SegmentPool;
use super::state::{Segment, SegmentId, Terrain};
use crate::error::{PoolError, SimError};
use crate::tuning::Tuning;

pub struct PathGenerator {
    tuning: Rc<Tuning>,
    pool: SegmentPool,
    rng: Pcg32,
    advancing: bool,
    speed: f32,
    horizontal_ramp: f32,
    vertical_ramp: f32,
    /// Sign of the last alternating lateral offset
    side: f32,
    spawn_ready: bool,
    spawn_probability: f32,
    last_active: Option<SegmentId>,
}

impl PathGenerator {
    pub fn new(tuning: Rc<Tuning>, seed: u64) -> Self {
        let pool = SegmentPool::new(
            tuning.segment_archetypes,
            tuning.pool_batch_size,
            tuning.segment_length,
            tuning.pool_cap,
        );
        Self {
            speed: tuning.base_speed,
            tuning,
            pool,
            rng: Pcg32::seed_from_u64(seed),
            advancing: false,
            horizontal_ramp: 0.0,
            vertical_ramp: 0.0,
            side: 1.0,
            spawn_ready: false,
            spawn_probability: 0.0,
            last_active: None,
        }
    }

    pub fn pool(&self) -> &SegmentPool {
        &self.pool
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_advancing(&self) -> bool {
        self.advancing
    }

    pub fn ramps(&self) -> (f32, f32) {
        (self.horizontal_ramp, self.vertical_ramp)
    }

    /// Live item probability, `None` until the controller publishes one
    pub fn spawn_probability(&self) -> Option<f32> {
        self.spawn_ready.then_some(self.spawn_probability)
    }

    /// Active segment ids following forward links from the oldest
    pub fn chain(&self) -> Vec<SegmentId> {
        let mut chain = Vec::with_capacity(self.pool.active_len());
        let mut cursor = self.pool.oldest();
        while let Some(id) = cursor {
            chain.push(id);
            cursor = self.pool.get(id).and_then(|s| s.next);
        }
        chain
    }

    /// Scroll active segments and recycle the ones past the threshold
    pub fn tick(&mut self, dt: f32) -> Outbox {
        let mut outbox = Outbox::new();
        if !self.advancing {
            return outbox;
        }

        let dz = self.speed * dt;
        let ids: Vec<SegmentId> = self.pool.active_ids().collect();
        for id in ids {
            if let Some(seg) = self.pool.get_mut(id) {
                seg.pos.z -= dz;
            }
        }

        // Spawn order equals Z order, so only the oldest can be behind
        while let Some(oldest) = self.pool.oldest() {
            let behind = self
                .pool
                .get(oldest)
                .is_some_and(|s| s.pos.z < self.tuning.recycle_z);
            if !behind {
                break;
            }
            if let Err(e) = self.pool.release(oldest) {
                log::error!("Recycle failed: {e}");
                break;
            }
            match self.spawn() {
                Ok(request) => outbox.extend(request),
                Err(e) => {
                    log::warn!("Replacement spawn skipped: {e}");
                    break;
                }
            }
        }
        outbox
    }

    /// Place one segment after the current newest and link it
    pub fn spawn(&mut self) -> Result<Option<GameEvent>, PoolError> {
        let prev = self
            .last_active
            .and_then(|id| self.pool.get(id))
            .filter(|s| s.active)
            .map(|s| (s.id, s.pos));

        // Acquire first so a refused spawn leaves the RNG and side untouched
        let id = self.pool.acquire()?;
        let pos = match prev {
            None => Vec3::ZERO,
            Some((_, prev_pos)) => self.next_position(prev_pos),
        };
        if let Some(seg) = self.pool.get_mut(id) {
            seg.pos = pos;
        }
        self.advance_ramps();

        let mut request = None;
        if let Some((prev_id, prev_pos)) = prev {
            self.pool.link(prev_id, id)?;
            if self.spawn_ready && self.rng.random::<f32>() < self.spawn_probability {
                if let Some(anchor) = self.pool.get(prev_id).map(Segment::anchor) {
                    request = Some(GameEvent::ItemSpawnRequest {
                        anchor,
                        position: prev_pos,
                    });
                }
            }
        }

        self.last_active = Some(id);
        Ok(request)
    }

    fn next_position(&mut self, prev: Vec3) -> Vec3 {
        let t = &self.tuning;
        let lo = t.min_gap(self.speed);
        let hi = t.max_gap(self.speed);
        let dz = if hi > lo {
            self.rng.random_range(lo..hi)
        } else {
            lo
        };

        let max_x = t.max_offset_x;
        let x = if self.rng.random::<f32>() < self.horizontal_ramp {
            self.rng.random_range(-max_x..=max_x)
        } else {
            self.side = -self.side;
            self.side * self.rng.random_range(max_x / 2.0..=max_x)
        };

        let step = if self.rng.random::<f32>() < self.vertical_ramp {
            t.vertical_step
        } else {
            -t.vertical_step
        };
        let y = (prev.y + step).clamp(0.0, t.max_height);

        Vec3::new(x, y, prev.z + dz)
    }

    fn advance_ramps(&mut self) {
        let t = &self.tuning;
        self.horizontal_ramp =
            (self.horizontal_ramp + t.horizontal_ramp_rate).clamp(0.0, t.horizontal_ramp_max);
        self.vertical_ramp =
            (self.vertical_ramp + t.vertical_ramp_rate).clamp(0.0, t.vertical_ramp_max);
    }

    fn initialize(&mut self) -> Outbox {
        if self.pool.total() == 0 {
            self.pool.warm(self.tuning.pool_batch_size);
        }
        if self.pool.active_len() > 0 {
            log::warn!(
                "Initialize with {} active segments, draining first",
                self.pool.active_len()
            );
            self.reset();
        }
        self.horizontal_ramp = 0.0;
        self.vertical_ramp = 0.0;
        self.side = 1.0;

        let mut outbox = Outbox::new();
        for _ in 0..self.tuning.initial_segments {
            match self.spawn() {
                Ok(request) => outbox.extend(request),
                Err(e) => {
                    log::warn!("Initial spawn stopped early: {e}");
                    break;
                }
            }
        }
        log::debug!("Path seeded with {} segments", self.pool.active_len());
        outbox
    }

    fn reset(&mut self) {
        self.pool.release_all();
        self.last_active = None;
        self.advancing = false;
    }
}

impl Terrain for PathGenerator {
    fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.pool.get(id)
    }

    fn active_segments(&self) -> Box<dyn Iterator<Item = &Segment> + '_> {
        self.pool.active_segments()
    }
}

impl Component for PathGenerator {
    const NAME: &'static str = "path";
    const SENDER: Sender = Sender::Path;
    const TOPICS: &'static [Topic] = &[
        Topic::Initialize,
        Topic::GameStart,
        Topic::GameOver,
        Topic::Reset,
        Topic::UpdateItemSpawnProb,
        Topic::SpeedChanged,
    ];

    fn on_event(&mut self, event: &GameEvent) -> Result<Outbox, SimError> {
        match *event {
            GameEvent::Initialize(_) => return Ok(self.initialize()),
            GameEvent::GameStart(_) => self.advancing = true,
            GameEvent::Reset(_) => self.reset(),
            GameEvent::GameOver(_) => {
                self.advancing = false;
                self.spawn_ready = false;
                self.spawn_probability = 0.0;
            }
            GameEvent::UpdateItemSpawnProb(p) => {
                self.spawn_ready = true;
                self.spawn_probability = p;
            }
            GameEvent::SpeedChanged(speed) => self.speed = speed,
            _ => {}
        }
        Ok(Outbox::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn generator(tuning: Tuning) -> PathGenerator {
        PathGenerator::new(Rc::new(tuning), 7)
    }

    fn positions(path: &PathGenerator) -> Vec<Vec3> {
        path.chain()
            .into_iter()
            .filter_map(|id| path.segment(id).map(|s| s.pos))
            .collect()
    }

    #[test]
    fn test_initialize_seeds_linked_chain() {
        let mut path = generator(Tuning::default());
        path.on_event(&GameEvent::Initialize(true)).unwrap();

        assert_eq!(path.pool().active_len(), 8);
        let chain = path.chain();
        assert_eq!(chain.len(), 8);
        let pos = positions(&path);
        assert_eq!(pos[0], Vec3::ZERO);
        for w in pos.windows(2) {
            assert!(w[1].z > w[0].z);
            // No Z overlap between neighbours
            assert!(w[1].z - 5.0 / 2.0 > w[0].z + 5.0 / 2.0);
        }
        let last = path.segment(*chain.last().unwrap()).unwrap();
        assert!(last.next.is_none());
    }

    #[test]
    fn test_alternating_side_without_randomness() {
        let tuning = Tuning {
            horizontal_ramp_max: 0.0,
            vertical_ramp_max: 0.0,
            initial_segments: 12,
            ..Default::default()
        };
        let max_x = tuning.max_offset_x;
        let mut path = generator(tuning);
        path.on_event(&GameEvent::Initialize(true)).unwrap();

        let pos = positions(&path);
        for w in pos[1..].windows(2) {
            assert!(w[0].x.signum() != w[1].x.signum());
        }
        for p in &pos[1..] {
            assert!(p.x.abs() >= max_x / 2.0 && p.x.abs() <= max_x);
            // Vertical ramp pinned at zero: always stepping down, clamped at 0
            assert_eq!(p.y, 0.0);
        }
    }

    #[test]
    fn test_ramps_saturate() {
        let tuning = Tuning::default();
        let (h_max, v_max) = (tuning.horizontal_ramp_max, tuning.vertical_ramp_max);
        let mut path = generator(tuning);
        path.on_event(&GameEvent::Initialize(true)).unwrap();
        let mut last = path.ramps();
        for _ in 0..200 {
            path.spawn().unwrap();
            let now = path.ramps();
            assert!(now.0 >= last.0 && now.1 >= last.1);
            assert!(now.0 <= h_max && now.1 <= v_max);
            last = now;
        }
        assert_eq!(last, (h_max, v_max));

        path.on_event(&GameEvent::Reset(true)).unwrap();
        path.on_event(&GameEvent::Initialize(true)).unwrap();
        assert!(path.ramps().0 < h_max);
    }

    #[test]
    fn test_heights_stay_in_range() {
        let tuning = Tuning {
            vertical_ramp_max: 1.0,
            vertical_ramp_rate: 0.1,
            ..Default::default()
        };
        let max_y = tuning.max_height;
        let mut path = generator(tuning);
        path.on_event(&GameEvent::Initialize(true)).unwrap();
        for _ in 0..100 {
            path.spawn().unwrap();
        }
        for seg in path.active_segments() {
            assert!(seg.pos.y >= 0.0 && seg.pos.y <= max_y);
        }
    }

    #[test]
    fn test_tick_recycles_and_keeps_count() {
        let mut path = generator(Tuning::default());
        path.on_event(&GameEvent::Initialize(true)).unwrap();
        let total = path.pool().total();

        // Not started: nothing moves
        path.tick(1.0);
        assert_eq!(positions(&path)[0], Vec3::ZERO);

        path.on_event(&GameEvent::GameStart(true)).unwrap();
        for _ in 0..600 {
            path.tick(1.0 / 60.0);
            assert_eq!(path.pool().active_len(), 8);
            assert_eq!(path.chain().len(), 8);
        }
        let pos = positions(&path);
        assert!(pos[0].z >= -10.0);
        assert!(pos.windows(2).all(|w| w[1].z > w[0].z));
        assert_eq!(path.pool().total(), total);
    }

    #[test]
    fn test_reset_drains_active() {
        let mut path = generator(Tuning::default());
        path.on_event(&GameEvent::Initialize(true)).unwrap();
        path.on_event(&GameEvent::GameStart(true)).unwrap();
        path.on_event(&GameEvent::Reset(true)).unwrap();

        assert_eq!(path.pool().active_len(), 0);
        assert_eq!(path.pool().free_len(), path.pool().total());
        assert!(!path.is_advancing());
        for id in 0..path.pool().total() as u32 {
            assert!(path.segment(SegmentId(id)).unwrap().next.is_none());
        }
    }

    #[test]
    fn test_game_over_stops_and_clears_probability() {
        let mut path = generator(Tuning::default());
        path.on_event(&GameEvent::Initialize(true)).unwrap();
        path.on_event(&GameEvent::GameStart(true)).unwrap();
        path.on_event(&GameEvent::UpdateItemSpawnProb(0.2)).unwrap();
        assert_eq!(path.spawn_probability(), Some(0.2));

        path.on_event(&GameEvent::GameOver(true)).unwrap();
        assert!(!path.is_advancing());
        assert_eq!(path.spawn_probability(), None);
        let before = positions(&path);
        path.tick(0.5);
        assert_eq!(positions(&path), before);
    }

    #[test]
    fn test_spawn_requests_item_on_previous_segment() {
        let mut path = generator(Tuning::default());
        path.on_event(&GameEvent::Initialize(true)).unwrap();
        let prev = path.chain().last().copied().unwrap();

        path.on_event(&GameEvent::UpdateItemSpawnProb(1.0)).unwrap();
        let request = path.spawn().unwrap();
        let seg = path.segment(prev).unwrap();
        assert_eq!(
            request,
            Some(GameEvent::ItemSpawnRequest {
                anchor: seg.anchor(),
                position: seg.pos,
            })
        );

        path.on_event(&GameEvent::UpdateItemSpawnProb(0.0)).unwrap();
        assert_eq!(path.spawn().unwrap(), None);
    }

    #[test]
    fn test_capped_pool_stops_spawning() {
        let tuning = Tuning {
            pool_cap: Some(8),
            segment_archetypes: 1,
            ..Default::default()
        };
        let mut path = generator(tuning);
        path.on_event(&GameEvent::Initialize(true)).unwrap();
        assert_eq!(path.pool().active_len(), 8);
        assert!(matches!(path.spawn(), Err(PoolError::Exhausted { capacity: 8 })));
    }

    #[test]
    fn test_refused_spawn_keeps_alternation() {
        let tuning = Tuning {
            pool_cap: Some(8),
            segment_archetypes: 1,
            horizontal_ramp_max: 0.0,
            ..Default::default()
        };
        let mut path = generator(tuning);
        path.on_event(&GameEvent::Initialize(true)).unwrap();
        let before = positions(&path).last().unwrap().x;
        assert!(path.spawn().is_err());

        // Recycle exactly the oldest segment; its replacement swaps sides
        path.on_event(&GameEvent::GameStart(true)).unwrap();
        path.tick(1.01);
        assert_eq!(path.pool().active_len(), 8);
        let after = positions(&path).last().unwrap().x;
        assert_ne!(before.signum(), after.signum());
    }

    proptest! {
        #[test]
        fn prop_gap_within_bounds(seed in any::<u64>(), speed in 10.0f32..25.0) {
            let tuning = Tuning::default();
            let (lo, hi) = (tuning.min_gap(speed), tuning.max_gap(speed));
            let mut path = PathGenerator::new(Rc::new(tuning), seed);
            path.on_event(&GameEvent::SpeedChanged(speed)).unwrap();
            path.on_event(&GameEvent::Initialize(true)).unwrap();
            for _ in 0..20 {
                path.spawn().unwrap();
            }
            let pos = positions(&path);
            for w in pos.windows(2) {
                let gap = w[1].z - w[0].z;
                prop_assert!(
                    gap >= lo - 1e-3 && gap < hi + 1e-3,
                    "gap {} not in [{}, {})",
                    gap,
                    lo,
                    hi
                );
            }
        }
    }
}
