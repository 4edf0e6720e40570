//! # Component Storage
//!
//! Two storage families back the component columns, both fully allocated
//! when the world is built:
//!
//! - [`SizedStore`]: one contiguous byte buffer with a fixed stride,
//!   holding encoded values for every entity slot
//! - [`BoxedStore`]: one heap slot per entity behind `dyn Any`, for
//!   payloads without a byte encoding
//!
//! Stores are mechanical. Presence bits decide whether a slot is
//! meaningful; the stores themselves always hold decodable data.

use std::any::{Any, TypeId};

use crate::ecs::component::FixedCodec;
use crate::ecs::entity::EntityId;

/// Type-erased value accepted by boxed columns and write records.
pub(crate) type BoxedValue = Box<dyn Any + Send + Sync>;

type BoxedInit = Box<dyn Fn() -> BoxedValue + Send + Sync>;

// =============================================================================
// Sized storage
// =============================================================================

/// Dense byte column for one sized component.
///
/// Every slot is pre-filled with the codec's initial value and restored to
/// it on reset. Typed access is checked against the codec the column was
/// declared with.
pub(crate) struct SizedStore {
    name: String,
    width: usize,
    type_id: TypeId,
    type_name: &'static str,
    initial: Box<[u8]>,
    bytes: Box<[u8]>,
    encode_erased: fn(&dyn Any, &mut [u8]) -> bool,
}

impl SizedStore {
    /// Allocates the column and fills every slot with `C::initial()`.
    pub(crate) fn new<C: FixedCodec>(name: &str, capacity: usize) -> Self {
        let mut initial = vec![0u8; C::WIDTH].into_boxed_slice();
        C::initial().encode_into(&mut initial);

        let mut bytes = vec![0u8; C::WIDTH * capacity].into_boxed_slice();
        for slot in bytes.chunks_exact_mut(C::WIDTH) {
            slot.copy_from_slice(&initial);
        }

        Self {
            name: name.to_owned(),
            width: C::WIDTH,
            type_id: TypeId::of::<C>(),
            type_name: std::any::type_name::<C>(),
            initial,
            bytes,
            encode_erased: encode_any::<C>,
        }
    }

    /// Name of the codec type this column was declared with.
    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Decodes the value in one slot.
    ///
    /// Returns `None` when `C` is not the declared codec (with a warning)
    /// or the slot is out of range.
    pub(crate) fn read<C: FixedCodec>(&self, id: EntityId) -> Option<C> {
        if TypeId::of::<C>() != self.type_id {
            tracing::warn!(
                component = %self.name,
                declared = self.type_name,
                requested = std::any::type_name::<C>(),
                "typed read does not match declared codec"
            );
            return None;
        }
        let range = self.range(id)?;
        Some(C::decode_from(&self.bytes[range]))
    }

    /// Encodes a value into one slot.
    ///
    /// Returns `false` when `C` is not the declared codec (with a warning)
    /// or the slot is out of range.
    pub(crate) fn write<C: FixedCodec>(&mut self, id: EntityId, value: &C) -> bool {
        if TypeId::of::<C>() != self.type_id {
            tracing::warn!(
                component = %self.name,
                declared = self.type_name,
                requested = std::any::type_name::<C>(),
                "typed write does not match declared codec"
            );
            return false;
        }
        match self.range(id) {
            Some(range) => {
                value.encode_into(&mut self.bytes[range]);
                true
            }
            None => false,
        }
    }

    /// Encodes a type-erased value into one slot.
    ///
    /// Returns `false` on codec mismatch or out-of-range slot; the caller
    /// owns the diagnostics.
    pub(crate) fn write_erased(&mut self, id: EntityId, value: &dyn Any) -> bool {
        match self.range(id) {
            Some(range) => (self.encode_erased)(value, &mut self.bytes[range]),
            None => false,
        }
    }

    /// Restores one slot to the codec's initial value.
    pub(crate) fn reset(&mut self, id: EntityId) {
        if let Some(range) = self.range(id) {
            self.bytes[range].copy_from_slice(&self.initial);
        }
    }

    fn range(&self, id: EntityId) -> Option<std::ops::Range<usize>> {
        let start = id.index().checked_mul(self.width)?;
        let end = start + self.width;
        (end <= self.bytes.len()).then_some(start..end)
    }
}

fn encode_any<C: FixedCodec>(value: &dyn Any, out: &mut [u8]) -> bool {
    match value.downcast_ref::<C>() {
        Some(concrete) => {
            concrete.encode_into(out);
            true
        }
        None => false,
    }
}

// =============================================================================
// Boxed storage
// =============================================================================

/// Heap column for one boxed component.
///
/// Every slot is pre-filled by the declared init closure and restored by
/// it on reset, so a read always finds a value of the declared type.
pub(crate) struct BoxedStore {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    slots: Vec<BoxedValue>,
    init: BoxedInit,
}

impl BoxedStore {
    /// Allocates the column and fills every slot with `init()`.
    pub(crate) fn new<T, F>(name: &str, capacity: usize, init: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let init: BoxedInit = Box::new(move || Box::new(init()));
        let slots = (0..capacity).map(|_| init()).collect();

        Self {
            name: name.to_owned(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            slots,
            init,
        }
    }

    /// Name of the payload type this column was declared with.
    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrows the value in one slot.
    ///
    /// Returns `None` when `T` is not the declared payload type (with a
    /// warning) or the slot is out of range.
    pub(crate) fn read<T: 'static>(&self, id: EntityId) -> Option<&T> {
        if TypeId::of::<T>() != self.type_id {
            tracing::warn!(
                component = %self.name,
                declared = self.type_name,
                requested = std::any::type_name::<T>(),
                "typed read does not match declared payload type"
            );
            return None;
        }
        self.slots.get(id.index())?.downcast_ref::<T>()
    }

    /// Replaces the value in one slot.
    ///
    /// Returns `false` when `T` is not the declared payload type (with a
    /// warning) or the slot is out of range.
    pub(crate) fn write<T: Send + Sync + 'static>(&mut self, id: EntityId, value: T) -> bool {
        if TypeId::of::<T>() != self.type_id {
            tracing::warn!(
                component = %self.name,
                declared = self.type_name,
                requested = std::any::type_name::<T>(),
                "typed write does not match declared payload type"
            );
            return false;
        }
        match self.slots.get_mut(id.index()) {
            Some(slot) => {
                *slot = Box::new(value);
                true
            }
            None => false,
        }
    }

    /// Replaces the value in one slot with an already-boxed payload.
    ///
    /// Returns `false` on payload type mismatch or out-of-range slot; the
    /// caller owns the diagnostics.
    pub(crate) fn write_box(&mut self, id: EntityId, value: BoxedValue) -> bool {
        if value.as_ref().type_id() != self.type_id {
            return false;
        }
        match self.slots.get_mut(id.index()) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Restores one slot to a fresh `init()` value.
    pub(crate) fn reset(&mut self, id: EntityId) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = (self.init)();
        }
    }
}

// =============================================================================
// Store table
// =============================================================================

/// All component stores of one world, indexed by the slots recorded in
/// the component registry.
pub(crate) struct Stores {
    pub(crate) sized: Vec<SizedStore>,
    pub(crate) boxed: Vec<BoxedStore>,
}

impl Stores {
    /// Restores every column of one entity slot to its initial value.
    pub(crate) fn reset_entity(&mut self, id: EntityId) {
        for store in &mut self.sized {
            store.reset(id);
        }
        for store in &mut self.boxed {
            store.reset(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::Vec3;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Charge(u16);

    impl FixedCodec for Charge {
        const WIDTH: usize = 2;

        fn initial() -> Self {
            Self(7)
        }

        fn encode_into(&self, out: &mut [u8]) {
            out.copy_from_slice(&self.0.to_le_bytes());
        }

        fn decode_from(bytes: &[u8]) -> Self {
            Self(u16::from_le_bytes([bytes[0], bytes[1]]))
        }
    }

    #[test]
    fn test_sized_slots_start_at_initial() {
        let store = SizedStore::new::<Charge>("charge", 8);
        assert_eq!(store.read::<Charge>(EntityId::new(0)), Some(Charge(7)));
        assert_eq!(store.read::<Charge>(EntityId::new(7)), Some(Charge(7)));
    }

    #[test]
    fn test_sized_write_read_roundtrip() {
        let mut store = SizedStore::new::<Vec3>("position", 4);
        let value = Vec3::new(1.5, -2.25, 0.0);

        assert!(store.write(EntityId::new(2), &value));
        assert_eq!(store.read::<Vec3>(EntityId::new(2)), Some(value));
        // Neighbouring slots are untouched
        assert_eq!(store.read::<Vec3>(EntityId::new(1)), Some(Vec3::initial()));
        assert_eq!(store.read::<Vec3>(EntityId::new(3)), Some(Vec3::initial()));
    }

    #[test]
    fn test_sized_codec_mismatch_is_rejected() {
        let mut store = SizedStore::new::<Vec3>("position", 4);
        assert!(!store.write(EntityId::new(0), &Charge(1)));
        assert_eq!(store.read::<Charge>(EntityId::new(0)), None);
    }

    #[test]
    fn test_sized_erased_write_checks_type() {
        let mut store = SizedStore::new::<Charge>("charge", 4);

        let good: BoxedValue = Box::new(Charge(99));
        assert!(store.write_erased(EntityId::new(1), good.as_ref()));
        assert_eq!(store.read::<Charge>(EntityId::new(1)), Some(Charge(99)));

        let bad: BoxedValue = Box::new(Vec3::new(1.0, 2.0, 3.0));
        assert!(!store.write_erased(EntityId::new(1), bad.as_ref()));
        assert_eq!(store.read::<Charge>(EntityId::new(1)), Some(Charge(99)));
    }

    #[test]
    fn test_sized_reset_restores_initial() {
        let mut store = SizedStore::new::<Charge>("charge", 4);
        store.write(EntityId::new(0), &Charge(500));
        store.reset(EntityId::new(0));
        assert_eq!(store.read::<Charge>(EntityId::new(0)), Some(Charge(7)));
    }

    #[test]
    fn test_sized_out_of_range_degrades() {
        let mut store = SizedStore::new::<Charge>("charge", 4);
        assert!(!store.write(EntityId::new(4), &Charge(1)));
        assert_eq!(store.read::<Charge>(EntityId::new(4)), None);
    }

    #[test]
    fn test_boxed_write_read_roundtrip() {
        let mut store = BoxedStore::new("label", 4, || String::from("unnamed"));

        assert_eq!(
            store.read::<String>(EntityId::new(0)).map(String::as_str),
            Some("unnamed")
        );
        assert!(store.write(EntityId::new(0), String::from("alpha")));
        assert_eq!(
            store.read::<String>(EntityId::new(0)).map(String::as_str),
            Some("alpha")
        );
    }

    #[test]
    fn test_boxed_payload_type_is_checked() {
        let mut store = BoxedStore::new("label", 4, || String::from("unnamed"));
        assert!(!store.write(EntityId::new(0), 42u32));
        assert_eq!(store.read::<u32>(EntityId::new(0)), None);

        let bad: BoxedValue = Box::new(42u32);
        assert!(!store.write_box(EntityId::new(0), bad));
    }

    #[test]
    fn test_boxed_reset_reruns_init() {
        let mut store = BoxedStore::new("label", 4, || String::from("unnamed"));
        store.write(EntityId::new(2), String::from("beta"));
        store.reset(EntityId::new(2));
        assert_eq!(
            store.read::<String>(EntityId::new(2)).map(String::as_str),
            Some("unnamed")
        );
    }

    #[test]
    fn test_store_table_resets_every_family() {
        let mut stores = Stores {
            sized: vec![SizedStore::new::<Charge>("charge", 4)],
            boxed: vec![BoxedStore::new("label", 4, || String::from("unnamed"))],
        };
        let id = EntityId::new(1);
        stores.sized[0].write(id, &Charge(3));
        stores.boxed[0].write(id, String::from("gamma"));

        stores.reset_entity(id);
        assert_eq!(stores.sized[0].read::<Charge>(id), Some(Charge(7)));
        assert_eq!(
            stores.boxed[0].read::<String>(id).map(String::as_str),
            Some("unnamed")
        );
    }
}
