//! Reusable segment inventory
//!
//! Segments live in one arena indexed by [`SegmentId`] and are never freed
//! during a session. Each one is either in `free` or in `active`; `active` is
//! ordered by spawn time, oldest first.

use std::collections::VecDeque;

use super::state::{Segment, SegmentId, Terrain};
use crate::error::PoolError;

#[derive(Debug, Clone)]
pub struct SegmentPool {
    segments: Vec<Segment>,
    free: Vec<SegmentId>,
    active: VecDeque<SegmentId>,
    archetypes: u32,
    batch_size: usize,
    segment_length: f32,
    cap: Option<usize>,
}

impl SegmentPool {
    /// Empty pool; nothing is allocated until [`warm`](Self::warm)
    pub fn new(
        archetypes: u32,
        batch_size: usize,
        segment_length: f32,
        cap: Option<usize>,
    ) -> Self {
        Self {
            segments: Vec::new(),
            free: Vec::new(),
            active: VecDeque::new(),
            archetypes: archetypes.max(1),
            batch_size: batch_size.max(1),
            segment_length,
            cap,
        }
    }

    /// Allocate `batch_size` inactive segments per archetype.
    ///
    /// With a cap configured the batch is truncated at the cap. Returns how
    /// many segments were added.
    pub fn warm(&mut self, batch_size: usize) -> usize {
        let mut added = 0;
        for archetype in 0..self.archetypes {
            for _ in 0..batch_size {
                if self.cap.is_some_and(|cap| self.segments.len() >= cap) {
                    break;
                }
                let id = SegmentId(self.segments.len() as u32);
                self.segments.push(Segment::new(id, archetype, self.segment_length));
                self.free.push(id);
                added += 1;
            }
        }
        if added > 0 {
            log::debug!("Segment pool warmed: +{added}, total {}", self.segments.len());
        }
        added
    }

    /// Take a free segment and mark it active (appended as the newest).
    ///
    /// Grows the pool by one batch when nothing is free. Only fails when a cap
    /// is configured and already reached.
    pub fn acquire(&mut self) -> Result<SegmentId, PoolError> {
        if self.free.is_empty() && self.warm(self.batch_size) == 0 {
            let capacity = self.segments.len();
            log::warn!("Segment pool exhausted at capacity {capacity}");
            return Err(PoolError::Exhausted { capacity });
        }
        let id = self
            .free
            .pop()
            .ok_or(PoolError::Exhausted {
                capacity: self.segments.len(),
            })?;

        let seg = &mut self.segments[id.index()];
        debug_assert!(!seg.active, "free list held an active segment");
        seg.active = true;
        seg.generation = seg.generation.wrapping_add(1);
        seg.next = None;
        seg.prev = None;
        self.active.push_back(id);
        Ok(id)
    }

    /// Deactivate `id`, clear both links touching it and return it to `free`
    pub fn release(&mut self, id: SegmentId) -> Result<(), PoolError> {
        let is_active = self.segments.get(id.index()).is_some_and(|s| s.active);
        if !is_active {
            return Err(PoolError::NotActive(id));
        }

        // Oldest-first release is the common case
        if self.active.front() == Some(&id) {
            self.active.pop_front();
        } else if let Some(pos) = self.active.iter().position(|&a| a == id) {
            self.active.remove(pos);
        }

        let seg = &mut self.segments[id.index()];
        seg.active = false;
        let next = seg.next.take();
        let prev = seg.prev.take();
        if let Some(next) = next {
            self.segments[next.index()].prev = None;
        }
        if let Some(prev) = prev {
            self.segments[prev.index()].next = None;
        }

        self.free.push(id);
        Ok(())
    }

    /// Release every active segment
    pub fn release_all(&mut self) {
        while let Some(&id) = self.active.back() {
            if self.release(id).is_err() {
                // Unreachable while the partition holds; drop it to avoid spinning
                self.active.pop_back();
            }
        }
    }

    /// Set `from.next = to`. Both must be active.
    pub fn link(&mut self, from: SegmentId, to: SegmentId) -> Result<(), PoolError> {
        debug_assert_ne!(from, to, "segment linked to itself");
        for id in [from, to] {
            if !self.segments.get(id.index()).is_some_and(|s| s.active) {
                return Err(PoolError::NotActive(id));
            }
        }
        self.segments[from.index()].next = Some(to);
        self.segments[to.index()].prev = Some(from);
        Ok(())
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.index())
    }

    pub fn get_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.segments.get_mut(id.index())
    }

    /// Active ids, oldest first
    pub fn active_ids(&self) -> impl ExactSizeIterator<Item = SegmentId> + '_ {
        self.active.iter().copied()
    }

    /// Most recently acquired active segment
    pub fn newest(&self) -> Option<SegmentId> {
        self.active.back().copied()
    }

    pub fn oldest(&self) -> Option<SegmentId> {
        self.active.front().copied()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn total(&self) -> usize {
        self.segments.len()
    }

    pub fn cap(&self) -> Option<usize> {
        self.cap
    }
}

impl Terrain for SegmentPool {
    fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.get(id)
    }

    fn active_segments(&self) -> Box<dyn Iterator<Item = &Segment> + '_> {
        Box::new(self.active.iter().map(|id| &self.segments[id.index()]))
    }
}
