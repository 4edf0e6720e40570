//! # Snapshot Queries
//!
//! A query resolves once against the current presence words and returns an
//! immutable snapshot: the matching live ids in ascending slot order, plus
//! one bound reader per requested value column. Entities created or
//! destroyed after the snapshot never show up in it.

use crate::ecs::component::{ComponentKind, FixedCodec, Registry};
use crate::ecs::entity::EntityId;
use crate::ecs::presence::{PresenceIndex, EXISTENCE};
use crate::ecs::storage::{BoxedStore, SizedStore, Stores};

/// Result of one query: matched ids plus readers for the requested
/// value columns.
///
/// Flag components narrow the match but carry no payload, so they get no
/// reader. The existence column is always conjoined and never needs to be
/// requested.
pub struct Query<'w> {
    ids: Vec<EntityId>,
    readers: Vec<Reader<'w>>,
}

impl<'w> Query<'w> {
    /// Matched live ids in ascending slot order.
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    /// Number of matched ids.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing matched.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Reader bound to one requested value column.
    ///
    /// Returns `None` for names that were not requested and for flag
    /// components.
    #[must_use]
    pub fn reader(&self, name: &str) -> Option<&Reader<'w>> {
        self.readers.iter().find(|reader| reader.name == name)
    }
}

/// Read access to one value column, gated by its presence bit.
pub struct Reader<'w> {
    name: &'w str,
    presence: &'w PresenceIndex,
    mask: u32,
    column: Column<'w>,
}

#[derive(Clone, Copy)]
enum Column<'w> {
    Sized(&'w SizedStore),
    Boxed(&'w BoxedStore),
}

impl<'w> Reader<'w> {
    /// Decodes the component value for one entity.
    ///
    /// Returns `None` when the entity does not hold the component, or when
    /// the column is boxed (with a warning).
    #[must_use]
    pub fn get<C: FixedCodec>(&self, id: EntityId) -> Option<C> {
        if !self.presence.has_mask(id, self.mask) {
            return None;
        }
        match self.column {
            Column::Sized(store) => store.read(id),
            Column::Boxed(_) => {
                tracing::warn!(
                    component = self.name,
                    "value read on boxed column, use get_boxed"
                );
                None
            }
        }
    }

    /// Decodes the component value for each given entity, skipping
    /// entities that do not hold it.
    #[must_use]
    pub fn get_many<C: FixedCodec>(&self, ids: &[EntityId]) -> Vec<C> {
        ids.iter().filter_map(|&id| self.get(id)).collect()
    }

    /// Borrows the boxed payload for one entity.
    ///
    /// Returns `None` when the entity does not hold the component, or when
    /// the column is sized (with a warning).
    #[must_use]
    pub fn get_boxed<T: 'static>(&self, id: EntityId) -> Option<&'w T> {
        if !self.presence.has_mask(id, self.mask) {
            return None;
        }
        match self.column {
            Column::Boxed(store) => store.read(id),
            Column::Sized(_) => {
                tracing::warn!(
                    component = self.name,
                    "boxed read on value column, use get"
                );
                None
            }
        }
    }
}

/// Resolves a query against the current presence words.
///
/// An unknown component name warns and yields an empty query.
pub(crate) fn snapshot<'w>(
    registry: &'w Registry,
    presence: &'w PresenceIndex,
    stores: &'w Stores,
    names: &[&str],
) -> Query<'w> {
    let mut readers = Vec::with_capacity(names.len());
    for &name in names {
        if name == EXISTENCE {
            continue;
        }
        let Some(meta) = registry.get(name) else {
            tracing::warn!(component = name, "unknown component name in query");
            return Query {
                ids: Vec::new(),
                readers: Vec::new(),
            };
        };
        let column = match meta.kind {
            ComponentKind::Flag => None,
            ComponentKind::Sized { slot } => Some(Column::Sized(&stores.sized[slot])),
            ComponentKind::Boxed { slot } => Some(Column::Boxed(&stores.boxed[slot])),
        };
        if let Some(column) = column {
            readers.push(Reader {
                name: meta.name.as_str(),
                presence,
                mask: meta.mask,
                column,
            });
        }
    }

    let mut with_existence = Vec::with_capacity(names.len() + 1);
    with_existence.push(EXISTENCE);
    with_existence.extend_from_slice(names);

    Query {
        ids: presence.have_all(&[], &with_existence),
        readers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{ComponentMeta, Vec3};
    use crate::ecs::presence::EXISTENCE_MASK;

    fn fixture() -> (Registry, PresenceIndex, Stores) {
        let registry = Registry::new(vec![
            ComponentMeta {
                name: "position".to_owned(),
                mask: 1 << 1,
                kind: ComponentKind::Sized { slot: 0 },
            },
            ComponentMeta {
                name: "label".to_owned(),
                mask: 1 << 2,
                kind: ComponentKind::Boxed { slot: 0 },
            },
            ComponentMeta {
                name: "tag".to_owned(),
                mask: 1 << 3,
                kind: ComponentKind::Flag,
            },
        ]);
        let presence = PresenceIndex::new(
            32,
            &[
                "position".to_owned(),
                "label".to_owned(),
                "tag".to_owned(),
            ],
        )
        .unwrap();
        let stores = Stores {
            sized: vec![SizedStore::new::<Vec3>("position", 32)],
            boxed: vec![BoxedStore::new("label", 32, String::new)],
        };
        (registry, presence, stores)
    }

    fn spawn_with_position(
        presence: &mut PresenceIndex,
        stores: &mut Stores,
        slot: u32,
        value: Vec3,
    ) -> EntityId {
        let id = EntityId::new(slot);
        presence.include_mask(id, EXISTENCE_MASK);
        presence.include(&[id], &["position"]);
        stores.sized[0].write(id, &value);
        id
    }

    #[test]
    fn test_snapshot_matches_live_holders_in_ascending_order() {
        let (registry, mut presence, mut stores) = fixture();
        spawn_with_position(&mut presence, &mut stores, 9, Vec3::new(9.0, 0.0, 0.0));
        spawn_with_position(&mut presence, &mut stores, 2, Vec3::new(2.0, 0.0, 0.0));
        // Holds the component but is not live
        presence.include(&[EntityId::new(5)], &["position"]);

        let query = snapshot(&registry, &presence, &stores, &["position"]);
        assert_eq!(query.ids(), &[EntityId::new(2), EntityId::new(9)]);
    }

    #[test]
    fn test_empty_request_matches_all_live() {
        let (registry, mut presence, stores) = fixture();
        presence.include_mask(EntityId::new(0), EXISTENCE_MASK);
        presence.include_mask(EntityId::new(3), EXISTENCE_MASK);

        let query = snapshot(&registry, &presence, &stores, &[]);
        assert_eq!(query.len(), 2);
        assert!(query.reader("position").is_none());
    }

    #[test]
    fn test_unknown_name_yields_empty_query() {
        let (registry, mut presence, stores) = fixture();
        presence.include_mask(EntityId::new(0), EXISTENCE_MASK);

        let query = snapshot(&registry, &presence, &stores, &["position", "missing"]);
        assert!(query.is_empty());
        assert!(query.reader("position").is_none());
    }

    #[test]
    fn test_reader_decodes_and_gates_on_presence() {
        let (registry, mut presence, mut stores) = fixture();
        let held = spawn_with_position(&mut presence, &mut stores, 1, Vec3::new(1.5, -2.25, 0.0));
        presence.include_mask(EntityId::new(4), EXISTENCE_MASK);

        let query = snapshot(&registry, &presence, &stores, &["position"]);
        let reader = query.reader("position").unwrap();
        assert_eq!(reader.get::<Vec3>(held), Some(Vec3::new(1.5, -2.25, 0.0)));
        assert_eq!(reader.get::<Vec3>(EntityId::new(4)), None);
    }

    #[test]
    fn test_get_many_skips_entities_without_the_component() {
        let (registry, mut presence, mut stores) = fixture();
        let a = spawn_with_position(&mut presence, &mut stores, 0, Vec3::new(1.0, 0.0, 0.0));
        presence.include_mask(EntityId::new(1), EXISTENCE_MASK);
        let b = spawn_with_position(&mut presence, &mut stores, 2, Vec3::new(2.0, 0.0, 0.0));

        let query = snapshot(&registry, &presence, &stores, &["position"]);
        let reader = query.reader("position").unwrap();
        let values = reader.get_many::<Vec3>(&[a, EntityId::new(1), b]);
        assert_eq!(values, vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_boxed_reader_roundtrip() {
        let (registry, mut presence, mut stores) = fixture();
        let id = EntityId::new(6);
        presence.include_mask(id, EXISTENCE_MASK);
        presence.include(&[id], &["label"]);
        stores.boxed[0].write(id, String::from("scout"));

        let query = snapshot(&registry, &presence, &stores, &["label"]);
        let reader = query.reader("label").unwrap();
        assert_eq!(reader.get_boxed::<String>(id).map(String::as_str), Some("scout"));
        // Wrong access family degrades to None
        assert_eq!(reader.get::<Vec3>(id), None);
    }

    #[test]
    fn test_flag_components_narrow_but_have_no_reader() {
        let (registry, mut presence, mut stores) = fixture();
        let tagged = spawn_with_position(&mut presence, &mut stores, 0, Vec3::new(0.0, 0.0, 0.0));
        presence.include(&[tagged], &["tag"]);
        spawn_with_position(&mut presence, &mut stores, 1, Vec3::new(0.0, 0.0, 0.0));

        let query = snapshot(&registry, &presence, &stores, &["position", "tag"]);
        assert_eq!(query.ids(), &[tagged]);
        assert!(query.reader("tag").is_none());
        assert!(query.reader("position").is_some());
    }
}
