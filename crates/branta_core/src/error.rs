//! # Kernel Error Types
//!
//! Schema validation is the only fallible phase besides entity allocation.
//! Everything that can be rejected is rejected at build time; runtime misuse
//! degrades to warnings instead.

use thiserror::Error;

/// Errors that can occur while validating a world schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Requested capacity is below the supported minimum.
    #[error("capacity {requested} is below the minimum of {minimum} entity slots")]
    CapacityTooSmall {
        /// The capacity that was requested.
        requested: usize,
        /// The smallest capacity a world accepts.
        minimum: usize,
    },

    /// Requested capacity does not fit the entity id width.
    #[error("capacity {requested} exceeds the addressable maximum of {maximum}")]
    CapacityTooLarge {
        /// The capacity that was requested.
        requested: usize,
        /// The largest capacity a world accepts.
        maximum: usize,
    },

    /// More components declared than a presence word can track.
    #[error("declared {declared} components, a presence word tracks at most {maximum}")]
    TooManyComponents {
        /// Number of components declared.
        declared: usize,
        /// Number of component bits available per entity.
        maximum: usize,
    },

    /// The same component name was declared twice.
    #[error("component declared twice: {0}")]
    DuplicateComponent(String),

    /// A declared component name collides with a built-in column.
    #[error("component name is reserved: {0}")]
    ReservedName(String),

    /// A sized component declared a zero-byte encoding.
    #[error("component has a zero-width encoding: {0}")]
    ZeroWidthComponent(String),

    /// The same stage name was declared twice.
    #[error("stage declared twice: {0}")]
    DuplicateStage(String),
}

/// Result type for schema validation.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Error returned when entity allocation finds no free slot.
///
/// The world never grows. Once every slot is live, creation fails until
/// something is destroyed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("all {capacity} entity slots are live")]
pub struct CapacityError {
    /// Total number of slots in the world.
    pub capacity: usize,
}
