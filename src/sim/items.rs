//! Collectible spawning and pickup
//!
//! Items ride on the segment they were requested for. When that segment is
//! recycled the item silently disappears; only touching the ball scores.

use std::rc::Rc;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::ball_item_overlap;
use super::events::{Component, GameEvent, Outbox, Sender, Topic};
use super::state::{Anchor, Item, Terrain, Tier};
use crate::error::SimError;
use crate::tuning::{ItemDef, Tuning};

/// Map a roll in [0, 100) to a rarity tier
pub fn choose_tier(roll: f32, rare_threshold: f32, epic_threshold: f32) -> Tier {
    if roll < rare_threshold {
        Tier::Common
    } else if roll < epic_threshold {
        Tier::Rare
    } else {
        Tier::Epic
    }
}

pub struct ItemSpawner {
    tuning: Rc<Tuning>,
    rng: Pcg32,
    items: Vec<Item>,
    next_id: u32,
}

impl ItemSpawner {
    pub fn new(tuning: Rc<Tuning>, seed: u64) -> Self {
        Self {
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            items: Vec::with_capacity(16),
            next_id: 1,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    fn tier_list(&self, tier: Tier) -> &[ItemDef] {
        match tier {
            Tier::Common => &self.tuning.items.common,
            Tier::Rare => &self.tuning.items.rare,
            Tier::Epic => &self.tuning.items.epic,
        }
    }

    /// Roll a tier and an item from it and place it on `anchor`
    pub fn spawn(&mut self, anchor: Anchor) -> Option<&Item> {
        let roll = self.rng.random_range(0.0..100.0);
        let tier = choose_tier(roll, self.tuning.rare_threshold, self.tuning.epic_threshold);

        let len = self.tier_list(tier).len();
        if len == 0 {
            log::warn!("No items in {tier:?} tier, spawn skipped");
            return None;
        }
        let pick = self.rng.random_range(0..len);
        let def = self.tier_list(tier)[pick].clone();

        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Item {
            id,
            tier,
            name: def.name,
            value: def.value,
            anchor,
            offset: Vec3::new(0.0, self.tuning.item_float_height, 0.0),
        });
        log::debug!("Spawned {tier:?} item {id}");
        self.items.last()
    }

    /// World position of an item, if its segment is still live
    pub fn item_position(item: &Item, terrain: &dyn Terrain) -> Option<Vec3> {
        terrain.anchor_position(item.anchor).map(|p| p + item.offset)
    }

    /// Drop orphaned items and collect the ones touching the ball
    pub fn tick(&mut self, terrain: &dyn Terrain, ball: Option<(Vec3, f32)>) -> Outbox {
        let mut outbox = Outbox::new();
        let item_radius = self.tuning.item_radius;
        self.items.retain(|item| {
            let Some(pos) = Self::item_position(item, terrain) else {
                log::trace!("Item {} lost its anchor", item.id);
                return false;
            };
            match ball {
                Some((ball_pos, ball_radius))
                    if ball_item_overlap(ball_pos, ball_radius, pos, item_radius) =>
                {
                    outbox.push(GameEvent::CollectItem(item.value));
                    false
                }
                _ => true,
            }
        });
        outbox
    }
}

impl Component for ItemSpawner {
    const NAME: &'static str = "items";
    const SENDER: Sender = Sender::Items;
    const TOPICS: &'static [Topic] = &[Topic::ItemSpawnRequest, Topic::Initialize, Topic::Reset];

    fn on_event(&mut self, event: &GameEvent) -> Result<Outbox, SimError> {
        match *event {
            GameEvent::ItemSpawnRequest { anchor, .. } => {
                self.spawn(anchor);
            }
            GameEvent::Initialize(_) | GameEvent::Reset(_) => self.items.clear(),
            _ => {}
        }
        Ok(Outbox::new())
    }
}
