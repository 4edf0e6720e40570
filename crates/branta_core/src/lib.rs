//! # BRANTA Core Kernel
//!
//! Fixed-capacity Entity Component System (ECS) designed for:
//! - Deterministic, allocation-stable simulation state
//! - Bounded worlds sized once at startup
//! - Staged, ordered system execution
//!
//! ## Architecture Rules
//!
//! 1. **All storage allocated at build** - attach and destroy never grow memory
//! 2. **Presence is a bitmask** - one `u32` word per entity, existence on bit 0
//! 3. **Construction fails loudly, usage degrades** - schema mistakes are
//!    `Result`s, runtime misuse warns and no-ops
//!
//! ## Example
//!
//! ```rust,ignore
//! use branta_core::{Schema, Vec3, World};
//!
//! let mut world: World = Schema::new(128)
//!     .sized::<Vec3>("position")
//!     .sized::<Vec3>("velocity")
//!     .stage("integrate")
//!     .build()?;
//!
//! let id = world.entity_create()?;
//! world.attach(id, "position", Vec3::new(0.0, 1.0, 0.0));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod error;

pub use ecs::{
    Emit, EntityId, FixedCodec, Query, Reader, Row, Schema, SystemDef, Transform, Vec3, World,
    EXISTENCE, MAX_COMPONENTS, MIN_CAPACITY,
};
pub use error::{CapacityError, SchemaError, SchemaResult};
