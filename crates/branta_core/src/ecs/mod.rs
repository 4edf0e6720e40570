//! # Entity Component Kernel
//!
//! A fixed-capacity ECS with bitmask presence tracking.
//!
//! ## Design Philosophy
//!
//! - All storage is allocated when the world is built
//! - Presence is one `u32` word per entity slot, existence on bit 0
//! - Queries are snapshots, never live views
//! - Systems are pure transforms with declared read and write sets

mod component;
mod entity;
mod presence;
mod query;
mod schedule;
mod storage;
mod world;

pub use component::{FixedCodec, Vec3};
pub use entity::EntityId;
pub use presence::{EXISTENCE, MAX_COMPONENTS};
pub use query::{Query, Reader};
pub use schedule::{Emit, Row, SystemDef, Transform};
pub use world::{Schema, World, MIN_CAPACITY};
