//! # Presence Index
//!
//! One `u32` word per entity slot records which columns are attached.
//! Bit 0 is the built-in existence column; declared components own bits
//! 1 and up, assigned in declaration order.
//!
//! This layer is mechanical. It matches and mutates bit patterns without
//! any liveness rules; callers conjoin the existence column themselves
//! when they want live entities only.

use std::collections::HashMap;

use crate::ecs::entity::EntityId;
use crate::error::SchemaError;

/// Name of the built-in existence column.
///
/// Present on every live entity. Systems that destroy entities declare it
/// in their write set.
pub const EXISTENCE: &str = "__existence__";

/// Presence bit owned by the existence column.
pub(crate) const EXISTENCE_MASK: u32 = 1;

/// Maximum number of user-declared components per world.
///
/// One presence word is 32 bits and the existence column owns one of them.
pub const MAX_COMPONENTS: usize = (u32::BITS - 1) as usize;

/// Per-entity presence words plus the name-to-bit assignment.
#[derive(Debug)]
pub(crate) struct PresenceIndex {
    /// One word per entity slot.
    words: Box<[u32]>,
    /// Column name to single-bit mask, existence included.
    masks: HashMap<String, u32>,
}

impl PresenceIndex {
    /// Builds the index, assigning bit `i + 1` to the `i`-th declared name.
    ///
    /// # Errors
    ///
    /// Rejects more names than [`MAX_COMPONENTS`], duplicate names, and
    /// names colliding with [`EXISTENCE`].
    pub(crate) fn new(capacity: usize, names: &[String]) -> Result<Self, SchemaError> {
        if names.len() > MAX_COMPONENTS {
            return Err(SchemaError::TooManyComponents {
                declared: names.len(),
                maximum: MAX_COMPONENTS,
            });
        }

        let mut masks = HashMap::with_capacity(names.len() + 1);
        masks.insert(EXISTENCE.to_owned(), EXISTENCE_MASK);

        for (ordinal, name) in names.iter().enumerate() {
            if name == EXISTENCE {
                return Err(SchemaError::ReservedName(name.clone()));
            }
            let bit = 1u32 << (ordinal as u32 + 1);
            if masks.insert(name.clone(), bit).is_some() {
                return Err(SchemaError::DuplicateComponent(name.clone()));
            }
        }

        Ok(Self {
            words: vec![0u32; capacity].into_boxed_slice(),
            masks,
        })
    }

    /// Number of entity slots.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.words.len()
    }

    /// Single-bit mask for a column name, existence included.
    #[inline]
    pub(crate) fn mask_of(&self, name: &str) -> Option<u32> {
        self.masks.get(name).copied()
    }

    // =========================================================================
    // Name-level operations
    // =========================================================================

    /// Sets the named columns on every given slot, or on all slots when
    /// `ids` is empty. Unknown names are skipped with a warning.
    pub(crate) fn include(&mut self, ids: &[EntityId], names: &[&str]) {
        let mask = self.resolve_known(names);
        if mask != 0 {
            self.apply(ids, |word| *word |= mask);
        }
    }

    /// Clears the named columns on every given slot, or on all slots when
    /// `ids` is empty. Unknown names are skipped with a warning.
    pub(crate) fn exclude(&mut self, ids: &[EntityId], names: &[&str]) {
        let mask = self.resolve_known(names);
        if mask != 0 {
            self.apply(ids, |word| *word &= !mask);
        }
    }

    /// Slots holding every named column, in candidate order, or in
    /// ascending slot order when `ids` is empty.
    ///
    /// An unknown name yields an empty result with a warning. An empty
    /// name list matches every slot.
    pub(crate) fn have_all(&self, ids: &[EntityId], names: &[&str]) -> Vec<EntityId> {
        let Some(mask) = self.resolve_all(names) else {
            return Vec::new();
        };
        self.select(ids, |word| word & mask == mask)
    }

    /// Slots holding at least one of the named columns, in candidate order,
    /// or in ascending slot order when `ids` is empty.
    ///
    /// Unknown names are skipped with a warning.
    pub(crate) fn have_any(&self, ids: &[EntityId], names: &[&str]) -> Vec<EntityId> {
        let mask = self.resolve_known(names);
        self.select(ids, |word| word & mask != 0)
    }

    // =========================================================================
    // Mask-level operations
    // =========================================================================

    /// Sets the masked bits on one slot.
    #[inline]
    pub(crate) fn include_mask(&mut self, id: EntityId, mask: u32) {
        if let Some(word) = self.words.get_mut(id.index()) {
            *word |= mask;
        }
    }

    /// Clears the masked bits on one slot.
    #[inline]
    pub(crate) fn exclude_mask(&mut self, id: EntityId, mask: u32) {
        if let Some(word) = self.words.get_mut(id.index()) {
            *word &= !mask;
        }
    }

    /// Whether one slot holds every masked bit.
    #[inline]
    pub(crate) fn has_mask(&self, id: EntityId, mask: u32) -> bool {
        self.words
            .get(id.index())
            .is_some_and(|word| word & mask == mask)
    }

    /// Whether one slot holds the existence column.
    #[inline]
    pub(crate) fn exists(&self, id: EntityId) -> bool {
        self.has_mask(id, EXISTENCE_MASK)
    }

    /// All slots holding every masked bit, in ascending order.
    pub(crate) fn matching(&self, mask: u32) -> Vec<EntityId> {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, word)| *word & mask == mask)
            .map(|(i, _)| EntityId::new(i as u32))
            .collect()
    }

    /// Number of slots holding every masked bit.
    pub(crate) fn count_matching(&self, mask: u32) -> usize {
        self.words.iter().filter(|word| *word & mask == mask).count()
    }

    /// Zeroes one slot's word, clearing existence and every column.
    #[inline]
    pub(crate) fn clear_word(&mut self, id: EntityId) {
        if let Some(word) = self.words.get_mut(id.index()) {
            *word = 0;
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// OR of all named bits. Any unknown name aborts with `None`.
    fn resolve_all(&self, names: &[&str]) -> Option<u32> {
        let mut mask = 0u32;
        for name in names {
            match self.masks.get(*name) {
                Some(bit) => mask |= bit,
                None => {
                    tracing::warn!(component = *name, "unknown component name in presence match");
                    return None;
                }
            }
        }
        Some(mask)
    }

    /// OR of the known named bits. Unknown names are skipped.
    fn resolve_known(&self, names: &[&str]) -> u32 {
        let mut mask = 0u32;
        for name in names {
            match self.masks.get(*name) {
                Some(bit) => mask |= bit,
                None => {
                    tracing::warn!(component = *name, "unknown component name in presence update");
                }
            }
        }
        mask
    }

    fn apply(&mut self, ids: &[EntityId], mut op: impl FnMut(&mut u32)) {
        if ids.is_empty() {
            for word in self.words.iter_mut() {
                op(word);
            }
        } else {
            for id in ids {
                match self.words.get_mut(id.index()) {
                    Some(word) => op(word),
                    None => {
                        tracing::warn!(entity = %id, "presence update for out-of-range entity ignored");
                    }
                }
            }
        }
    }

    fn select(&self, ids: &[EntityId], keep: impl Fn(u32) -> bool) -> Vec<EntityId> {
        if ids.is_empty() {
            self.words
                .iter()
                .enumerate()
                .filter(|(_, word)| keep(**word))
                .map(|(i, _)| EntityId::new(i as u32))
                .collect()
        } else {
            ids.iter()
                .copied()
                .filter(|id| match self.words.get(id.index()) {
                    Some(word) => keep(*word),
                    None => {
                        tracing::warn!(entity = %id, "presence match for out-of-range entity ignored");
                        false
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_bit_assignment_follows_declaration_order() {
        let index = PresenceIndex::new(32, &names(&["a", "b", "c"])).unwrap();
        assert_eq!(index.mask_of(EXISTENCE), Some(1));
        assert_eq!(index.mask_of("a"), Some(1 << 1));
        assert_eq!(index.mask_of("b"), Some(1 << 2));
        assert_eq!(index.mask_of("c"), Some(1 << 3));
        assert_eq!(index.mask_of("d"), None);
    }

    #[test]
    fn test_component_limit_is_word_width_minus_existence() {
        let full: Vec<String> = (0..MAX_COMPONENTS).map(|i| format!("c{i}")).collect();
        assert!(PresenceIndex::new(32, &full).is_ok());

        let over: Vec<String> = (0..=MAX_COMPONENTS).map(|i| format!("c{i}")).collect();
        assert_eq!(
            PresenceIndex::new(32, &over).unwrap_err(),
            SchemaError::TooManyComponents {
                declared: MAX_COMPONENTS + 1,
                maximum: MAX_COMPONENTS,
            }
        );
    }

    #[test]
    fn test_duplicate_and_reserved_names_rejected() {
        assert_eq!(
            PresenceIndex::new(32, &names(&["a", "a"])).unwrap_err(),
            SchemaError::DuplicateComponent("a".to_owned())
        );
        assert_eq!(
            PresenceIndex::new(32, &names(&["a", EXISTENCE])).unwrap_err(),
            SchemaError::ReservedName(EXISTENCE.to_owned())
        );
    }

    #[test]
    fn test_include_exclude_roundtrip() {
        let mut index = PresenceIndex::new(32, &names(&["a", "b"])).unwrap();
        let id = EntityId::new(3);

        index.include(&[id], &["a", "b"]);
        assert!(index.has_mask(id, (1 << 1) | (1 << 2)));

        index.exclude(&[id], &["b"]);
        assert!(index.has_mask(id, 1 << 1));
        assert!(!index.has_mask(id, 1 << 2));
    }

    #[test]
    fn test_empty_ids_means_every_slot() {
        let mut index = PresenceIndex::new(32, &names(&["a"])).unwrap();
        index.include(&[], &["a"]);
        assert_eq!(index.have_all(&[], &["a"]).len(), 32);

        index.exclude(&[], &["a"]);
        assert!(index.have_all(&[], &["a"]).is_empty());
    }

    #[test]
    fn test_have_all_is_conjunctive() {
        let mut index = PresenceIndex::new(32, &names(&["a", "b"])).unwrap();
        index.include(&[EntityId::new(0)], &["a"]);
        index.include(&[EntityId::new(1)], &["a", "b"]);
        index.include(&[EntityId::new(2)], &["b"]);

        assert_eq!(index.have_all(&[], &["a", "b"]), vec![EntityId::new(1)]);
        assert_eq!(
            index.have_any(&[], &["a", "b"]),
            vec![EntityId::new(0), EntityId::new(1), EntityId::new(2)]
        );
    }

    #[test]
    fn test_unknown_name_in_have_all_yields_empty() {
        let mut index = PresenceIndex::new(32, &names(&["a"])).unwrap();
        index.include(&[], &["a"]);
        assert!(index.have_all(&[], &["a", "missing"]).is_empty());
    }

    #[test]
    fn test_empty_name_list_matches_every_candidate() {
        let index = PresenceIndex::new(32, &names(&["a"])).unwrap();
        let picked = index.have_all(&[EntityId::new(5), EntityId::new(9)], &[]);
        assert_eq!(picked, vec![EntityId::new(5), EntityId::new(9)]);
    }

    #[test]
    fn test_matching_scans_in_ascending_order() {
        let mut index = PresenceIndex::new(32, &names(&["a"])).unwrap();
        for i in [7u32, 2, 19, 4] {
            index.include_mask(EntityId::new(i), EXISTENCE_MASK);
        }
        let ids: Vec<u32> = index
            .matching(EXISTENCE_MASK)
            .iter()
            .map(|id| id.index() as u32)
            .collect();
        assert_eq!(ids, vec![2, 4, 7, 19]);
    }

    #[test]
    fn test_clear_word_drops_every_column() {
        let mut index = PresenceIndex::new(32, &names(&["a", "b"])).unwrap();
        let id = EntityId::new(1);
        index.include_mask(id, EXISTENCE_MASK);
        index.include(&[id], &["a", "b"]);

        index.clear_word(id);
        assert!(!index.exists(id));
        assert!(index.have_any(&[id], &["a", "b"]).is_empty());
    }

    #[test]
    fn test_out_of_range_candidates_are_dropped() {
        let mut index = PresenceIndex::new(32, &names(&["a"])).unwrap();
        index.include(&[EntityId::new(99)], &["a"]);
        assert!(index.have_all(&[], &["a"]).is_empty());
        assert!(index.have_all(&[EntityId::new(99)], &["a"]).is_empty());
    }

    #[test]
    fn test_count_matching() {
        let mut index = PresenceIndex::new(32, &names(&["a"])).unwrap();
        index.include_mask(EntityId::new(0), EXISTENCE_MASK);
        index.include_mask(EntityId::new(5), EXISTENCE_MASK);
        assert_eq!(index.count_matching(EXISTENCE_MASK), 2);
    }
}
