//! # Component Model
//!
//! Components are named columns declared once, before the world is built.
//! Three kinds exist:
//!
//! - **Flag**: presence bit only, no payload
//! - **Sized**: fixed-width value encoded into a dense byte column
//! - **Boxed**: per-entity heap slot for payloads without a byte encoding
//!
//! Every declared component owns one bit in the per-entity presence word,
//! assigned in declaration order.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

/// Fixed-width byte encoding for sized component values.
///
/// Implementors define a wire width, an initial value for unattached slots,
/// and a symmetric encode/decode over exactly [`FixedCodec::WIDTH`] bytes.
/// The kernel pre-allocates `WIDTH * capacity` bytes per sized column and
/// never reallocates.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// struct Charge(u16);
///
/// impl FixedCodec for Charge {
///     const WIDTH: usize = 2;
///     fn initial() -> Self { Charge(0) }
///     fn encode_into(&self, out: &mut [u8]) { out.copy_from_slice(&self.0.to_le_bytes()); }
///     fn decode_from(bytes: &[u8]) -> Self { Charge(u16::from_le_bytes([bytes[0], bytes[1]])) }
/// }
/// ```
pub trait FixedCodec: Copy + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Number of bytes one encoded value occupies.
    const WIDTH: usize;

    /// Value a slot holds before any attach and again after a reset.
    fn initial() -> Self;

    /// Encodes this value into `out`. `out` is exactly [`FixedCodec::WIDTH`] bytes.
    fn encode_into(&self, out: &mut [u8]);

    /// Decodes a value from `bytes`. `bytes` is exactly [`FixedCodec::WIDTH`] bytes.
    fn decode_from(bytes: &[u8]) -> Self;
}

/// Three-component vector, the workhorse sized component.
///
/// Encodes as three little-endian `f32` values, 12 bytes total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns the squared length.
    ///
    /// Avoids the sqrt call for magnitude comparisons.
    #[inline]
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }
}

impl FixedCodec for Vec3 {
    const WIDTH: usize = 12;

    #[inline]
    fn initial() -> Self {
        Self::default()
    }

    #[inline]
    fn encode_into(&self, out: &mut [u8]) {
        out.copy_from_slice(bytemuck::bytes_of(self));
    }

    #[inline]
    fn decode_from(bytes: &[u8]) -> Self {
        bytemuck::pod_read_unaligned(bytes)
    }
}

/// How a component's payload is stored.
///
/// `slot` indexes into the world's store table for that family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ComponentKind {
    /// Presence bit only.
    Flag,
    /// Fixed-width bytes in a dense column.
    Sized {
        /// Index into the sized store table.
        slot: usize,
    },
    /// Heap slot per entity.
    Boxed {
        /// Index into the boxed store table.
        slot: usize,
    },
}

/// Description of one declared component, frozen at build time.
#[derive(Debug)]
pub(crate) struct ComponentMeta {
    /// Declared name, the key used across the public API.
    pub name: String,
    /// Single presence bit owned by this component.
    pub mask: u32,
    /// Storage family and slot.
    pub kind: ComponentKind,
}

/// Name-to-column lookup, frozen at build time.
///
/// Holds user-declared components only. The built-in existence column
/// lives in the presence index and never appears here.
#[derive(Debug)]
pub(crate) struct Registry {
    metas: Vec<ComponentMeta>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    pub(crate) fn new(metas: Vec<ComponentMeta>) -> Self {
        let by_name = metas
            .iter()
            .enumerate()
            .map(|(i, meta)| (meta.name.clone(), i))
            .collect();
        Self { metas, by_name }
    }

    /// Looks up a component by name.
    pub(crate) fn get(&self, name: &str) -> Option<&ComponentMeta> {
        self.by_name.get(name).map(|&i| &self.metas[i])
    }
}
