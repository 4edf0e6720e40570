//! # World and Schema
//!
//! A schema declares capacity, components, and stages up front. Building
//! it validates the whole declaration and allocates every column, so a
//! world that exists is a world whose storage is complete. After build
//! the component set, the capacity, and the stage order never change.

use std::fmt;

use crate::ecs::component::{ComponentKind, ComponentMeta, FixedCodec, Registry};
use crate::ecs::entity::{EntityAllocator, EntityId};
use crate::ecs::presence::{PresenceIndex, EXISTENCE_MASK};
use crate::ecs::query::{self, Query};
use crate::ecs::schedule::{Schedule, SystemDef};
use crate::ecs::storage::{BoxedStore, SizedStore, Stores};
use crate::error::{CapacityError, SchemaError};

/// Smallest capacity a world accepts.
pub const MIN_CAPACITY: usize = 32;

/// Largest capacity an entity handle can address.
const MAX_CAPACITY: usize = u32::MAX as usize;

// =============================================================================
// Schema
// =============================================================================

/// Builder for a world: capacity, component columns, and stage order.
///
/// Declaration order matters twice. Components receive presence bits in
/// declaration order, and stages run in declaration order every tick.
///
/// # Example
///
/// ```rust,ignore
/// let mut world: World<Sim> = Schema::new(128)
///     .sized::<Vec3>("position")
///     .sized::<Vec3>("velocity")
///     .flag("frozen")
///     .stage("integrate")
///     .stage("cleanup")
///     .build()?;
/// ```
pub struct Schema {
    capacity: usize,
    components: Vec<PendingComponent>,
    stages: Vec<String>,
}

struct PendingComponent {
    name: String,
    build: PendingBuild,
}

enum PendingBuild {
    Flag,
    Sized {
        width: usize,
        build: Box<dyn FnOnce(usize) -> SizedStore>,
    },
    Boxed {
        build: Box<dyn FnOnce(usize) -> BoxedStore>,
    },
}

impl Schema {
    /// Starts a schema for a world with `capacity` entity slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            components: Vec::new(),
            stages: Vec::new(),
        }
    }

    /// Declares a flag component: a presence bit with no payload.
    #[must_use]
    pub fn flag(mut self, name: &str) -> Self {
        self.components.push(PendingComponent {
            name: name.to_owned(),
            build: PendingBuild::Flag,
        });
        self
    }

    /// Declares a sized component encoded by `C`.
    #[must_use]
    pub fn sized<C: FixedCodec>(mut self, name: &str) -> Self {
        let column = name.to_owned();
        self.components.push(PendingComponent {
            name: name.to_owned(),
            build: PendingBuild::Sized {
                width: C::WIDTH,
                build: Box::new(move |capacity| SizedStore::new::<C>(&column, capacity)),
            },
        });
        self
    }

    /// Declares a boxed component holding values of `T`, with `init`
    /// producing the value every slot starts with and returns to on reset.
    #[must_use]
    pub fn boxed<T, F>(mut self, name: &str, init: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let column = name.to_owned();
        self.components.push(PendingComponent {
            name: name.to_owned(),
            build: PendingBuild::Boxed {
                build: Box::new(move |capacity| BoxedStore::new(&column, capacity, init)),
            },
        });
        self
    }

    /// Appends a stage to the tick order.
    #[must_use]
    pub fn stage(mut self, name: &str) -> Self {
        self.stages.push(name.to_owned());
        self
    }

    /// Validates the declaration and allocates the world.
    ///
    /// # Errors
    ///
    /// Rejects capacities outside the supported range, more components
    /// than a presence word tracks, duplicate or reserved component
    /// names, zero-width encodings, and duplicate stage names.
    pub fn build<H>(self) -> Result<World<H>, SchemaError> {
        if self.capacity < MIN_CAPACITY {
            return Err(SchemaError::CapacityTooSmall {
                requested: self.capacity,
                minimum: MIN_CAPACITY,
            });
        }
        if self.capacity > MAX_CAPACITY {
            return Err(SchemaError::CapacityTooLarge {
                requested: self.capacity,
                maximum: MAX_CAPACITY,
            });
        }

        for component in &self.components {
            if let PendingBuild::Sized { width: 0, .. } = component.build {
                return Err(SchemaError::ZeroWidthComponent(component.name.clone()));
            }
        }

        for (i, stage) in self.stages.iter().enumerate() {
            if self.stages[..i].contains(stage) {
                return Err(SchemaError::DuplicateStage(stage.clone()));
            }
        }

        let names: Vec<String> = self.components.iter().map(|c| c.name.clone()).collect();
        let presence = PresenceIndex::new(self.capacity, &names)?;

        // Presence assigned bit ordinal + 1 to each name; the metas below
        // must mirror that assignment exactly.
        let capacity = self.capacity;
        let mut metas = Vec::with_capacity(self.components.len());
        let mut sized = Vec::new();
        let mut boxed = Vec::new();
        for (ordinal, component) in self.components.into_iter().enumerate() {
            let mask = 1u32 << (ordinal as u32 + 1);
            let kind = match component.build {
                PendingBuild::Flag => ComponentKind::Flag,
                PendingBuild::Sized { build, .. } => {
                    sized.push(build(capacity));
                    ComponentKind::Sized {
                        slot: sized.len() - 1,
                    }
                }
                PendingBuild::Boxed { build } => {
                    boxed.push(build(capacity));
                    ComponentKind::Boxed {
                        slot: boxed.len() - 1,
                    }
                }
            };
            metas.push(ComponentMeta {
                name: component.name,
                mask,
                kind,
            });
        }

        Ok(World {
            registry: Registry::new(metas),
            presence,
            stores: Stores { sized, boxed },
            allocator: EntityAllocator::new(capacity),
            schedule: Schedule::new(self.stages),
        })
    }
}

// =============================================================================
// World
// =============================================================================

/// Fixed-capacity entity world.
///
/// `H` is the host state threaded through every system transform; worlds
/// that run without one use the default `()`.
///
/// Construction is the only fallible phase besides [`World::entity_create`].
/// Runtime misuse (dead entities, unknown names, type confusion) degrades
/// to a warning and a no-op, `false`, or `None`.
pub struct World<H = ()> {
    registry: Registry,
    presence: PresenceIndex,
    stores: Stores,
    allocator: EntityAllocator,
    schedule: Schedule<H>,
}

impl<H> fmt::Debug for World<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

impl<H> World<H> {
    // =========================================================================
    // Entity management
    // =========================================================================

    /// Claims the next free slot and marks it live.
    ///
    /// Slots are handed out round-robin: the scan starts at the most
    /// recently allocated slot and wraps at capacity.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] when every slot is live.
    pub fn entity_create(&mut self) -> Result<EntityId, CapacityError> {
        self.allocator.create(&mut self.presence)
    }

    /// Destroys an entity: clears its presence word and restores every
    /// column to its initial value. Destroying a dead entity is a no-op.
    pub fn entity_destroy(&mut self, id: EntityId) {
        self.allocator.destroy(&mut self.presence, &mut self.stores, id);
    }

    /// Whether the entity is live.
    #[inline]
    #[must_use]
    pub fn entity_exists(&self, id: EntityId) -> bool {
        self.presence.exists(id)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.presence.count_matching(EXISTENCE_MASK)
    }

    /// Total number of entity slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.presence.capacity()
    }

    // =========================================================================
    // Attachment
    // =========================================================================

    /// Attaches a sized component value to a live entity.
    ///
    /// Returns `false` with a warning when the entity is dead, the name is
    /// unknown, the column is not sized, or `C` is not the declared codec.
    pub fn attach<C: FixedCodec>(&mut self, id: EntityId, name: &str, value: C) -> bool {
        if !self.ensure_live(id, name) {
            return false;
        }
        let Some((_, kind)) = self.column(name) else {
            return false;
        };
        match kind {
            ComponentKind::Sized { slot } => {
                if self.stores.sized[slot].write(id, &value) {
                    self.presence.include(&[id], &[name]);
                    true
                } else {
                    false
                }
            }
            _ => {
                tracing::warn!(component = name, "sized attach to non-sized column ignored");
                false
            }
        }
    }

    /// Attaches a boxed component value to a live entity.
    ///
    /// Returns `false` with a warning when the entity is dead, the name is
    /// unknown, the column is not boxed, or `T` is not the declared
    /// payload type.
    pub fn attach_boxed<T: Send + Sync + 'static>(
        &mut self,
        id: EntityId,
        name: &str,
        value: T,
    ) -> bool {
        if !self.ensure_live(id, name) {
            return false;
        }
        let Some((_, kind)) = self.column(name) else {
            return false;
        };
        match kind {
            ComponentKind::Boxed { slot } => {
                if self.stores.boxed[slot].write(id, value) {
                    self.presence.include(&[id], &[name]);
                    true
                } else {
                    false
                }
            }
            _ => {
                tracing::warn!(component = name, "boxed attach to non-boxed column ignored");
                false
            }
        }
    }

    /// Sets a flag component on a live entity.
    ///
    /// Returns `false` with a warning when the entity is dead, the name is
    /// unknown, or the column is not a flag.
    pub fn attach_flag(&mut self, id: EntityId, name: &str) -> bool {
        if !self.ensure_live(id, name) {
            return false;
        }
        let Some((_, kind)) = self.column(name) else {
            return false;
        };
        match kind {
            ComponentKind::Flag => {
                self.presence.include(&[id], &[name]);
                true
            }
            _ => {
                tracing::warn!(component = name, "flag attach to value column ignored");
                false
            }
        }
    }

    /// Detaches a component from a live entity, clearing its presence bit
    /// and restoring the column slot to its initial value.
    ///
    /// Returns `false` when the entity is dead, the name is unknown, or
    /// the entity does not hold the component.
    pub fn detach(&mut self, id: EntityId, name: &str) -> bool {
        if !self.ensure_live(id, name) {
            return false;
        }
        let Some((mask, kind)) = self.column(name) else {
            return false;
        };
        if !self.presence.has_mask(id, mask) {
            return false;
        }
        self.presence.exclude(&[id], &[name]);
        match kind {
            ComponentKind::Sized { slot } => self.stores.sized[slot].reset(id),
            ComponentKind::Boxed { slot } => self.stores.boxed[slot].reset(id),
            ComponentKind::Flag => {}
        }
        true
    }

    /// Whether the entity holds the named column.
    ///
    /// Accepts [`crate::ecs::EXISTENCE`] as well as declared component
    /// names; an unknown name warns and reads as `false`.
    #[must_use]
    pub fn has_component(&self, id: EntityId, name: &str) -> bool {
        !self.presence.have_any(&[id], &[name]).is_empty()
    }

    /// Number of live entities holding the named column.
    #[must_use]
    pub fn component_count(&self, name: &str) -> usize {
        match self.presence.mask_of(name) {
            Some(mask) => self.presence.count_matching(mask | EXISTENCE_MASK),
            None => {
                tracing::warn!(component = name, "unknown component name in count");
                0
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Decodes a sized component value.
    ///
    /// Returns `None` when the entity does not hold the component, the
    /// name is unknown, or the column is not sized.
    #[must_use]
    pub fn read<C: FixedCodec>(&self, id: EntityId, name: &str) -> Option<C> {
        let (mask, kind) = self.column(name)?;
        if !self.presence.has_mask(id, mask) {
            return None;
        }
        match kind {
            ComponentKind::Sized { slot } => self.stores.sized[slot].read(id),
            _ => {
                tracing::warn!(component = name, "value read on non-sized column");
                None
            }
        }
    }

    /// Borrows a boxed component payload.
    ///
    /// Returns `None` when the entity does not hold the component, the
    /// name is unknown, or the column is not boxed.
    #[must_use]
    pub fn read_boxed<T: 'static>(&self, id: EntityId, name: &str) -> Option<&T> {
        let (mask, kind) = self.column(name)?;
        if !self.presence.has_mask(id, mask) {
            return None;
        }
        match kind {
            ComponentKind::Boxed { slot } => self.stores.boxed[slot].read(id),
            _ => {
                tracing::warn!(component = name, "boxed read on non-boxed column");
                None
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Snapshots the live entities holding every named component.
    ///
    /// An empty name list matches every live entity. Ids come back in
    /// ascending slot order with a bound reader per requested value
    /// column; an unknown name warns and yields an empty query.
    #[must_use]
    pub fn query(&self, names: &[&str]) -> Query<'_> {
        query::snapshot(&self.registry, &self.presence, &self.stores, names)
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Registers a system into its declared stage.
    ///
    /// Returns `false` with a warning when the stage is unknown, the name
    /// is already registered in that stage, or the query or write set
    /// names an unknown component.
    pub fn register_system(&mut self, def: SystemDef<H>) -> bool {
        self.schedule.register(&self.registry, def)
    }

    /// Runs one tick over all stages.
    ///
    /// `host` is threaded through every transform; `dt` is the tick delta
    /// in seconds.
    pub fn advance(&mut self, host: &mut H, dt: f32) {
        let Self {
            registry,
            presence,
            stores,
            allocator,
            schedule,
        } = self;
        schedule.run(host, dt, registry, presence, stores, allocator);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_live(&self, id: EntityId, name: &str) -> bool {
        if self.presence.exists(id) {
            true
        } else {
            tracing::warn!(entity = %id, component = name, "operation on dead entity ignored");
            false
        }
    }

    fn column(&self, name: &str) -> Option<(u32, ComponentKind)> {
        match self.registry.get(name) {
            Some(meta) => Some((meta.mask, meta.kind)),
            None => {
                tracing::warn!(component = name, "unknown component name");
                None
            }
        }
    }
}
