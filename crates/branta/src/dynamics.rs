//! # Standard Dynamics Pipeline
//!
//! The simulation every host runs: bodies carry position, velocity, and
//! acceleration columns; three stages integrate acceleration into velocity,
//! velocity into position, then cull anything that left the live region.
//!
//! The world is planar. Bodies keep a z column for their velocity, but
//! integrated positions stay in the z = 0 plane.

use branta_core::{Emit, EntityId, Schema, SystemDef, Vec3, World, EXISTENCE};

/// Column name for body position.
pub const POSITION: &str = "position";

/// Column name for body velocity.
pub const VELOCITY: &str = "velocity";

/// Column name for body acceleration.
pub const ACCELERATION: &str = "acceleration";

/// Flag column marking bodies the host wants highlighted.
pub const MARKER: &str = "marker";

/// Stage that folds acceleration into velocity.
pub const STAGE_ACCEL: &str = "accel_integration";

/// Stage that folds velocity into position.
pub const STAGE_VELOCITY: &str = "velocity_integration";

/// Stage that removes bodies outside the live region.
pub const STAGE_CULL: &str = "cull_oob";

/// Constant downward pull applied to every burst-spawned body.
pub const GRAVITY: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Host-side counters the systems update as they run.
///
/// Stands in for the eventual-state dispatch layer a real host threads
/// through `advance`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimStats {
    /// Bodies removed by the cull stage.
    pub culled: usize,
}

/// Declares the standard dynamics schema: three vector columns, the marker
/// flag, and the three integration stages in pipeline order.
///
/// The schema comes back unbuilt so callers can add their own columns and
/// stages before [`Schema::build`].
#[must_use]
pub fn sim_schema(capacity: usize) -> Schema {
    Schema::new(capacity)
        .sized::<Vec3>(POSITION)
        .sized::<Vec3>(VELOCITY)
        .sized::<Vec3>(ACCELERATION)
        .flag(MARKER)
        .stage(STAGE_ACCEL)
        .stage(STAGE_VELOCITY)
        .stage(STAGE_CULL)
}

/// Registers the standard pipeline into a world built from [`sim_schema`].
///
/// `bound` is the half-width of the live region; the cull stage removes a
/// body once `|x|` or `|y|` exceeds it. Returns `false` when any of the
/// three systems is rejected, which happens if the pipeline is already
/// registered or the schema is missing its columns or stages.
pub fn register_dynamics(world: &mut World<SimStats>, bound: f32) -> bool {
    let accel = world.register_system(SystemDef {
        stage: STAGE_ACCEL.to_owned(),
        name: "integrate_acceleration".to_owned(),
        query: vec![VELOCITY.to_owned(), ACCELERATION.to_owned()],
        writes: vec![VELOCITY.to_owned()],
        transform: Box::new(|_stats, dt, _id, row| {
            let (Some(v), Some(a)) = (row.get::<Vec3>(VELOCITY), row.get::<Vec3>(ACCELERATION))
            else {
                return Emit::new();
            };
            Emit::new().set(
                VELOCITY,
                Vec3::new(v.x + a.x * dt, v.y + a.y * dt, v.z + a.z * dt),
            )
        }),
    });

    let velocity = world.register_system(SystemDef {
        stage: STAGE_VELOCITY.to_owned(),
        name: "integrate_velocity".to_owned(),
        query: vec![POSITION.to_owned(), VELOCITY.to_owned()],
        writes: vec![POSITION.to_owned()],
        transform: Box::new(|_stats, dt, _id, row| {
            let (Some(p), Some(v)) = (row.get::<Vec3>(POSITION), row.get::<Vec3>(VELOCITY))
            else {
                return Emit::new();
            };
            // Positions stay in the z = 0 plane
            Emit::new().set(POSITION, Vec3::new(p.x + v.x * dt, p.y + v.y * dt, 0.0))
        }),
    });

    let cull = world.register_system(SystemDef {
        stage: STAGE_CULL.to_owned(),
        name: "cull_out_of_bounds".to_owned(),
        query: vec![POSITION.to_owned()],
        writes: vec![EXISTENCE.to_owned()],
        transform: Box::new(move |stats, _dt, _id, row| {
            let Some(p) = row.get::<Vec3>(POSITION) else {
                return Emit::new();
            };
            let inside = p.x.abs() <= bound && p.y.abs() <= bound;
            if !inside {
                stats.culled += 1;
            }
            Emit::new().existence(inside)
        }),
    });

    accel && velocity && cull
}

/// Spawns up to `count` bodies in a burst around `origin`.
///
/// Each body gets a jittered position, a sideways-and-down drift velocity,
/// [`GRAVITY`] as its acceleration, and the marker flag. The spread is a
/// pure function of `seed`, so two bursts with the same seed land
/// identically. Returns the spawned ids; the burst stops early when the
/// world fills up.
pub fn spawn_burst(
    world: &mut World<SimStats>,
    count: usize,
    origin: Vec3,
    seed: u32,
) -> Vec<EntityId> {
    let mut spawned = Vec::with_capacity(count);
    for i in 0..count {
        let id = match world.entity_create() {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(
                    %err,
                    spawned = spawned.len(),
                    requested = count,
                    "burst stopped early"
                );
                break;
            }
        };

        let salt = i as u32 * 4;
        world.attach(
            id,
            POSITION,
            Vec3::new(
                origin.x + 0.02 * (spread(seed, salt) + 1.0),
                origin.y + 0.02 * (spread(seed, salt + 1) + 1.0),
                0.0,
            ),
        );
        world.attach(
            id,
            VELOCITY,
            Vec3::new(
                0.5 * spread(seed, salt + 2),
                -1.5 + 0.5 * spread(seed, salt + 3),
                0.0,
            ),
        );
        world.attach(id, ACCELERATION, GRAVITY);
        world.attach_flag(id, MARKER);
        spawned.push(id);
    }
    spawned
}

/// Deterministic hash of (seed, salt), mapped onto [-1, 1).
fn spread(seed: u32, salt: u32) -> f32 {
    let bits = seed.wrapping_add(salt).wrapping_mul(0x9E37_79B9);
    let unit = (bits >> 8) as f32 / 16_777_216.0;
    unit.mul_add(2.0, -1.0)
}
