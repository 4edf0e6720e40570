//! # Staged Scheduler
//!
//! Systems are pure transforms registered into named stages. Each tick:
//!
//! 1. Stages run in the order they were declared at build time
//! 2. Systems within a stage run in registration order
//! 3. Each system snapshots its matching entities, then feeds every one
//!    through the transform and applies the returned record immediately
//!
//! A record that clears existence destroys the entity on the spot and
//! discards its remaining writes. All other writes land only on the
//! invoked entity, and only for columns the system declared writable.

use crate::ecs::component::{ComponentKind, ComponentMeta, FixedCodec, Registry};
use crate::ecs::entity::{EntityAllocator, EntityId};
use crate::ecs::presence::{PresenceIndex, EXISTENCE, EXISTENCE_MASK};
use crate::ecs::storage::{BoxedValue, Stores};

// =============================================================================
// Row - per-entity read view
// =============================================================================

/// Read view of one entity during a system invocation.
///
/// Reads are gated by the entity's presence bits, so a component the
/// entity does not hold reads as `None` even if the column has stale
/// bytes from a previous owner.
pub struct Row<'w> {
    registry: &'w Registry,
    presence: &'w PresenceIndex,
    stores: &'w Stores,
    id: EntityId,
}

impl Row<'_> {
    /// The entity this row belongs to.
    #[inline]
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Whether the entity holds the named column.
    ///
    /// Accepts [`EXISTENCE`] as well as declared component names; an
    /// unknown name warns and reads as `false`.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        match self.presence.mask_of(name) {
            Some(mask) => self.presence.has_mask(self.id, mask),
            None => {
                tracing::warn!(component = name, "unknown component name in row read");
                false
            }
        }
    }

    /// Decodes a sized component value.
    ///
    /// Returns `None` when the entity does not hold the component, the
    /// name is unknown, or the column is not sized.
    #[must_use]
    pub fn get<C: FixedCodec>(&self, name: &str) -> Option<C> {
        let meta = self.meta(name)?;
        if !self.presence.has_mask(self.id, meta.mask) {
            return None;
        }
        match meta.kind {
            ComponentKind::Sized { slot } => self.stores.sized[slot].read(self.id),
            ComponentKind::Boxed { .. } => {
                tracing::warn!(component = name, "value read on boxed column, use get_boxed");
                None
            }
            ComponentKind::Flag => {
                tracing::warn!(component = name, "value read on flag column");
                None
            }
        }
    }

    /// Borrows a boxed component payload.
    ///
    /// Returns `None` when the entity does not hold the component, the
    /// name is unknown, or the column is not boxed.
    #[must_use]
    pub fn get_boxed<T: 'static>(&self, name: &str) -> Option<&T> {
        let meta = self.meta(name)?;
        if !self.presence.has_mask(self.id, meta.mask) {
            return None;
        }
        match meta.kind {
            ComponentKind::Boxed { slot } => self.stores.boxed[slot].read(self.id),
            _ => {
                tracing::warn!(component = name, "boxed read on non-boxed column");
                None
            }
        }
    }

    fn meta(&self, name: &str) -> Option<&ComponentMeta> {
        let meta = self.registry.get(name);
        if meta.is_none() {
            tracing::warn!(component = name, "unknown component name in row read");
        }
        meta
    }
}

// =============================================================================
// Emit - per-entity write record
// =============================================================================

/// Write record returned by one system invocation for one entity.
///
/// Built fluently inside the transform:
///
/// ```rust,ignore
/// Emit::new()
///     .set("velocity", next_velocity)
///     .flag("stunned", false)
/// ```
///
/// Clearing existence destroys the entity and discards the record's other
/// writes. Setting existence on an already live entity changes nothing.
#[derive(Default)]
pub struct Emit {
    existence: Option<bool>,
    writes: Vec<(String, WritePayload)>,
}

enum WritePayload {
    Value(BoxedValue),
    Flag(bool),
}

impl Emit {
    /// An empty record: no writes, entity untouched.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a value write for a sized or boxed component.
    #[must_use]
    pub fn set<T: Send + Sync + 'static>(mut self, name: &str, value: T) -> Self {
        self.writes
            .push((name.to_owned(), WritePayload::Value(Box::new(value))));
        self
    }

    /// Queues a presence change for a flag component.
    #[must_use]
    pub fn flag(mut self, name: &str, present: bool) -> Self {
        self.writes.push((name.to_owned(), WritePayload::Flag(present)));
        self
    }

    /// Queues an existence change. `false` destroys the entity.
    #[must_use]
    pub fn existence(mut self, alive: bool) -> Self {
        self.existence = Some(alive);
        self
    }
}

// =============================================================================
// System declaration
// =============================================================================

/// Transform signature: host state, tick delta in seconds, the invoked
/// entity, and its read row. Returns the writes to apply.
pub type Transform<H> = Box<dyn Fn(&mut H, f32, EntityId, &Row<'_>) -> Emit + Send + Sync>;

/// Declaration of one system, handed to the world at registration time.
pub struct SystemDef<H> {
    /// Stage the system runs in. Must be one of the declared stages.
    pub stage: String,
    /// Name unique within the stage. Re-registering it is a warned no-op.
    pub name: String,
    /// Components an entity must hold for the transform to be invoked.
    pub query: Vec<String>,
    /// Components the transform may write. Include [`EXISTENCE`] to allow
    /// destroying the invoked entity.
    pub writes: Vec<String>,
    /// The transform itself.
    pub transform: Transform<H>,
}

struct RegisteredSystem<H> {
    name: String,
    query_mask: u32,
    write_mask: u32,
    may_destroy: bool,
    transform: Transform<H>,
}

// =============================================================================
// Schedule
// =============================================================================

/// Ordered stages with their registered systems.
pub(crate) struct Schedule<H> {
    stage_names: Vec<String>,
    systems: Vec<Vec<RegisteredSystem<H>>>,
}

impl<H> Schedule<H> {
    pub(crate) fn new(stage_names: Vec<String>) -> Self {
        let systems = stage_names.iter().map(|_| Vec::new()).collect();
        Self {
            stage_names,
            systems,
        }
    }

    /// Resolves and stores a system declaration.
    ///
    /// Rejections warn and return `false`: unknown stage, name already
    /// registered in the stage, or unknown component in the query or
    /// write set.
    pub(crate) fn register(&mut self, registry: &Registry, def: SystemDef<H>) -> bool {
        let Some(stage_index) = self.stage_names.iter().position(|s| *s == def.stage) else {
            tracing::warn!(stage = %def.stage, system = %def.name, "registration into unknown stage ignored");
            return false;
        };
        if self.systems[stage_index].iter().any(|s| s.name == def.name) {
            tracing::warn!(stage = %def.stage, system = %def.name, "system already registered in stage, ignored");
            return false;
        }

        let mut query_mask = EXISTENCE_MASK;
        for name in &def.query {
            if name == EXISTENCE {
                continue;
            }
            let Some(meta) = registry.get(name) else {
                tracing::warn!(system = %def.name, component = %name, "query names unknown component, registration ignored");
                return false;
            };
            query_mask |= meta.mask;
        }

        let mut write_mask = 0u32;
        let mut may_destroy = false;
        for name in &def.writes {
            if name == EXISTENCE {
                may_destroy = true;
                continue;
            }
            let Some(meta) = registry.get(name) else {
                tracing::warn!(system = %def.name, component = %name, "write set names unknown component, registration ignored");
                return false;
            };
            write_mask |= meta.mask;
        }

        self.systems[stage_index].push(RegisteredSystem {
            name: def.name,
            query_mask,
            write_mask,
            may_destroy,
            transform: def.transform,
        });
        true
    }

    /// Runs one tick: every stage in declared order, every system in
    /// registration order.
    ///
    /// Each system snapshots its matching entities up front, so entities
    /// destroyed mid-run never reach a transform through a snapshot taken
    /// before the destruction.
    pub(crate) fn run(
        &self,
        host: &mut H,
        dt: f32,
        registry: &Registry,
        presence: &mut PresenceIndex,
        stores: &mut Stores,
        allocator: &EntityAllocator,
    ) {
        for systems in &self.systems {
            for system in systems {
                let matched = presence.matching(system.query_mask);
                for id in matched {
                    let record = {
                        let row = Row {
                            registry,
                            presence: &*presence,
                            stores: &*stores,
                            id,
                        };
                        (system.transform)(host, dt, id, &row)
                    };
                    apply_record(system, registry, presence, stores, allocator, id, record);
                }
            }
        }
    }
}

/// Applies one write record to the invoked entity.
fn apply_record<H>(
    system: &RegisteredSystem<H>,
    registry: &Registry,
    presence: &mut PresenceIndex,
    stores: &mut Stores,
    allocator: &EntityAllocator,
    id: EntityId,
    record: Emit,
) {
    let Emit { existence, writes } = record;

    if existence == Some(false) {
        if system.may_destroy {
            allocator.destroy(presence, stores, id);
        } else {
            tracing::warn!(system = %system.name, entity = %id, "existence write outside declared write set ignored");
        }
        return;
    }

    for (name, payload) in writes {
        let Some(meta) = registry.get(&name) else {
            tracing::warn!(system = %system.name, component = %name, "write to unknown component ignored");
            continue;
        };
        if meta.mask & system.write_mask == 0 {
            tracing::warn!(system = %system.name, component = %name, "write outside declared write set ignored");
            continue;
        }
        match (payload, meta.kind) {
            (WritePayload::Value(value), ComponentKind::Sized { slot }) => {
                let store = &mut stores.sized[slot];
                if store.write_erased(id, value.as_ref()) {
                    presence.include_mask(id, meta.mask);
                } else {
                    tracing::warn!(
                        system = %system.name,
                        component = %name,
                        declared = store.type_name(),
                        "write value does not match declared codec, ignored"
                    );
                }
            }
            (WritePayload::Value(value), ComponentKind::Boxed { slot }) => {
                let store = &mut stores.boxed[slot];
                let declared = store.type_name();
                if store.write_box(id, value) {
                    presence.include_mask(id, meta.mask);
                } else {
                    tracing::warn!(
                        system = %system.name,
                        component = %name,
                        declared,
                        "write value does not match declared payload type, ignored"
                    );
                }
            }
            (WritePayload::Flag(true), ComponentKind::Flag) => {
                presence.include_mask(id, meta.mask);
            }
            (WritePayload::Flag(false), ComponentKind::Flag) => {
                presence.exclude_mask(id, meta.mask);
            }
            (WritePayload::Flag(_), _) => {
                tracing::warn!(system = %system.name, component = %name, "flag write to value column ignored");
            }
            (WritePayload::Value(_), ComponentKind::Flag) => {
                tracing::warn!(system = %system.name, component = %name, "value write to flag column ignored");
            }
        }
    }
}
