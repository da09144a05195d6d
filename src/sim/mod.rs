//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Components talk through the session's event bus, never to each other
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod difficulty;
pub mod events;
pub mod items;
pub mod path;
pub mod pool;
pub mod schedule;
pub mod state;
pub mod tick;
pub mod trajectory;

pub use body::Body;
pub use difficulty::Controller;
pub use events::{Component, EventBus, GameEvent, Handler, Outbox, Sender, Topic, attach, handler};
pub use items::{ItemSpawner, choose_tier};
pub use path::PathGenerator;
pub use pool::SegmentPool;
pub use schedule::{Deferred, Timer};
pub use state::{Anchor, GamePhase, Item, Segment, SegmentId, Terrain, Tier};
pub use tick::{Session, TickInput};
pub use trajectory::{flight_time, launch_velocity};
