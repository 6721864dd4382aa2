//! # Physics
//!
//! Point-mass rigid bodies driven by affectors and linked by distance
//! constraints. Each body follows a mesh: it takes its start position from
//! the mesh and writes its position back into the mesh every step.
//!
//! Step order:
//! ```text
//! 1. adopt      new bodies read their mesh translation
//! 2. clear      accumulated forces
//! 3. affect     enabled affectors push their bodies
//! 4. integrate  semi-implicit Euler, gravity, ground bounce
//! 5. constrain  distance constraints (stale endpoint -> constraint destroyed)
//! 6. sync       positions into meshes (stale mesh -> body destroyed)
//! ```
//!
//! Handles read from rows are never trusted: every cross-object reference is
//! re-validated through the store before it is followed.

use bytemuck::{Pod, Zeroable};
use prototype_core::{ObjectHandle, StateDb, StateKey, TypeId};
use prototype_shared::Vec3;

use crate::config::{CapacityConfig, PhysicsConfig};
use crate::error::AppResult;
use crate::module::{Module, Platform};
use crate::renderer::MeshKeys;

/// Collision group of the ground plane.
pub const GROUND_GROUP: u32 = 1 << 0;

/// `RigidBody::Info` row, written by other modules.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RigidBodyInfo {
    /// Mesh this body moves, as [`ObjectHandle::to_bits`]
    pub mesh_handle: u64,
    /// Linear velocity
    pub velocity: Vec3,
    /// Mass; zero or less means static
    pub mass: f32,
    /// Groups this body belongs to
    pub collision_group: u32,
    /// Groups this body collides with
    pub collision_mask: u32,
}

/// `RigidBody::PrivateInfo` row, owned by the integrator.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RigidBodyPrivate {
    /// Integrated position
    pub position: Vec3,
    /// Sum of affector forces this step
    pub accumulated_force: Vec3,
    /// Non-zero once the position was taken from the mesh
    pub initialized: u32,
}

/// `Affector::Info` row.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct AffectorInfo {
    /// Body the force acts on, as [`ObjectHandle::to_bits`]
    pub rigid_body_handle: u64,
    /// Point of application in the body's mesh space
    pub force_position: Vec3,
    /// Force applied this step
    pub force: Vec3,
    /// Non-zero if the force is applied
    pub enabled: u32,
    _pad: u32,
}

/// `Constraint::Info` row.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ConstraintInfo {
    /// First body, as [`ObjectHandle::to_bits`]
    pub body_a: u64,
    /// Second body, as [`ObjectHandle::to_bits`]
    pub body_b: u64,
    /// Distance the constraint maintains
    pub rest_length: f32,
    _pad: u32,
}

impl ConstraintInfo {
    /// Links two bodies at `rest_length`.
    #[must_use]
    pub fn new(body_a: ObjectHandle, body_b: ObjectHandle, rest_length: f32) -> Self {
        Self {
            body_a: body_a.to_bits(),
            body_b: body_b.to_bits(),
            rest_length,
            _pad: 0,
        }
    }
}

/// Registered ids of the physics types.
#[derive(Clone, Copy, Debug)]
pub struct PhysicsKeys {
    /// `RigidBody`
    pub rigid_body: TypeId,
    /// `RigidBody::Info`
    pub body_info: StateKey<RigidBodyInfo>,
    /// `RigidBody::PrivateInfo`
    pub body_private: StateKey<RigidBodyPrivate>,
    /// `Affector`
    pub affector: TypeId,
    /// `Affector::Info`
    pub affector_info: StateKey<AffectorInfo>,
    /// `Constraint`
    pub constraint: TypeId,
    /// `Constraint::Info`
    pub constraint_info: StateKey<ConstraintInfo>,
}

impl PhysicsKeys {
    /// Registers (or looks up) the physics types and states.
    pub fn register(db: &mut StateDb, capacity: &CapacityConfig) -> Self {
        let rigid_body = db.register_type("RigidBody", capacity.rigid_body);
        let affector = db.register_type("Affector", capacity.affector);
        let constraint = db.register_type("Constraint", capacity.constraint);
        Self {
            rigid_body,
            body_info: db.register_state(rigid_body, "Info"),
            body_private: db.register_state(rigid_body, "PrivateInfo"),
            affector,
            affector_info: db.register_state(affector, "Info"),
            constraint,
            constraint_info: db.register_state(constraint, "Info"),
        }
    }
}

/// Physics module.
pub struct Physics {
    config: PhysicsConfig,
    capacity: CapacityConfig,
    keys: Option<(PhysicsKeys, MeshKeys)>,
    doomed: Vec<ObjectHandle>,
    destroyed_bodies: u64,
    destroyed_constraints: u64,
}

impl Physics {
    /// Creates the module; capacities size the physics types and `Mesh`.
    #[must_use]
    pub fn new(config: PhysicsConfig, capacity: CapacityConfig) -> Self {
        Self {
            config,
            capacity,
            keys: None,
            doomed: Vec::new(),
            destroyed_bodies: 0,
            destroyed_constraints: 0,
        }
    }

    /// Bodies destroyed because their mesh went away.
    #[must_use]
    pub fn destroyed_bodies(&self) -> u64 {
        self.destroyed_bodies
    }

    /// Constraints destroyed because an endpoint went away.
    #[must_use]
    pub fn destroyed_constraints(&self) -> u64 {
        self.destroyed_constraints
    }

    fn adopt_mesh_positions(db: &mut StateDb, keys: PhysicsKeys, meshes: MeshKeys) {
        for idx in 1..=db.object_count(keys.rigid_body) {
            let Some(body) = db.handle_at(keys.rigid_body, idx) else {
                continue;
            };
            if db.state(keys.body_private, body).is_some_and(|p| p.initialized != 0) {
                continue;
            }
            let mesh = db
                .state(keys.body_info, body)
                .map(|info| ObjectHandle::from_bits(info.mesh_handle));
            let Some(translation) = mesh.and_then(|m| db.state(meshes.info, m)).map(|m| m.translation) else {
                continue;
            };
            if let Some(private) = db.state_mut(keys.body_private, body) {
                private.position = translation;
                private.initialized = 1;
            }
        }
    }

    fn apply_affectors(db: &mut StateDb, keys: PhysicsKeys) {
        for private in db.full_state_mut(keys.body_private) {
            private.accumulated_force = Vec3::ZERO;
        }

        let mut skipped = 0usize;
        for idx in 0..db.object_count(keys.affector) {
            let affector = db.full_state(keys.affector_info)[idx];
            if affector.enabled == 0 {
                continue;
            }
            let body = ObjectHandle::from_bits(affector.rigid_body_handle);
            match db.state_mut(keys.body_private, body) {
                Some(private) => private.accumulated_force += affector.force,
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(skipped, "affectors with stale rigid bodies");
        }
    }

    fn integrate(&self, db: &mut StateDb, keys: PhysicsKeys, dt: f32) {
        let gravity = Vec3::from_array(self.config.gravity);
        let ground = self.config.ground_height;
        let extent = self.config.ground_half_extent;
        let over_ground = |p: Vec3| p.x.abs() <= extent && p.y.abs() <= extent;

        if let Some((infos, privates)) = db.full_state_pair_mut(keys.body_info, keys.body_private) {
            for (info, private) in infos.iter_mut().zip(privates) {
                if info.mass <= 0.0 || private.initialized == 0 {
                    continue;
                }
                info.velocity += (gravity + private.accumulated_force * (1.0 / info.mass)) * dt;

                let next = private.position + info.velocity * dt;
                let hits_ground = info.collision_mask & GROUND_GROUP != 0
                    && over_ground(next)
                    && next.z < ground
                    && info.velocity.z < 0.0;
                if hits_ground {
                    info.velocity.z = -info.velocity.z * self.config.restitution;
                }
            }
        }

        if let Some((privates, infos)) = db.full_state_pair_mut(keys.body_private, keys.body_info) {
            for (private, info) in privates.iter_mut().zip(infos) {
                if info.mass <= 0.0 || private.initialized == 0 {
                    continue;
                }
                private.position += info.velocity * dt;
                if info.collision_mask & GROUND_GROUP != 0 && over_ground(private.position) {
                    private.position.z = private.position.z.max(ground);
                }
            }
        }
    }

    fn solve_constraints(&mut self, db: &mut StateDb, keys: PhysicsKeys) {
        self.doomed.clear();
        for constraint in db.full_state(keys.constraint_info) {
            let endpoints = [constraint.body_a, constraint.body_b].map(ObjectHandle::from_bits);
            if !endpoints.iter().all(|&b| db.is_object_handle_valid(b)) {
                if let Some(handle) = db.handle_from_elem(keys.constraint_info, constraint) {
                    self.doomed.push(handle);
                }
            }
        }
        for &constraint in &self.doomed {
            if db.destroy_object(constraint).is_ok() {
                self.destroyed_constraints += 1;
            }
        }

        for idx in 0..db.object_count(keys.constraint) {
            let constraint = db.full_state(keys.constraint_info)[idx];
            let a = ObjectHandle::from_bits(constraint.body_a);
            let b = ObjectHandle::from_bits(constraint.body_b);
            let (Some(&pa), Some(&pb)) = (db.state(keys.body_private, a), db.state(keys.body_private, b)) else {
                continue;
            };
            let inverse_mass = |h: ObjectHandle| {
                db.state(keys.body_info, h)
                    .filter(|info| info.mass > 0.0)
                    .map_or(0.0, |info| 1.0 / info.mass)
            };
            let (wa, wb) = (inverse_mass(a), inverse_mass(b));
            let delta = pb.position - pa.position;
            let distance = delta.length();
            if wa + wb <= 0.0 || distance <= f32::EPSILON {
                continue;
            }
            let correction = delta * ((distance - constraint.rest_length) / (distance * (wa + wb)));

            if let Some(p) = db.state_mut(keys.body_private, a) {
                p.position += correction * wa;
            }
            if let Some(p) = db.state_mut(keys.body_private, b) {
                p.position -= correction * wb;
            }
        }
    }

    fn sync_meshes(&mut self, db: &mut StateDb, keys: PhysicsKeys, meshes: MeshKeys) {
        self.doomed.clear();
        for info in db.full_state(keys.body_info) {
            if !db.is_object_handle_valid(ObjectHandle::from_bits(info.mesh_handle)) {
                if let Some(body) = db.handle_from_elem(keys.body_info, info) {
                    self.doomed.push(body);
                }
            }
        }

        for idx in 1..=db.object_count(keys.rigid_body) {
            let Some(body) = db.handle_at(keys.rigid_body, idx) else {
                continue;
            };
            let (Some(info), Some(private)) = (db.state(keys.body_info, body), db.state(keys.body_private, body)) else {
                continue;
            };
            if private.initialized == 0 {
                continue;
            }
            let (mesh, position) = (ObjectHandle::from_bits(info.mesh_handle), private.position);
            if let Some(row) = db.state_mut(meshes.info, mesh) {
                row.translation = position;
            }
        }

        for &body in &self.doomed {
            tracing::debug!(%body, "destroying rigid body of a stale mesh");
            if db.destroy_object(body).is_ok() {
                self.destroyed_bodies += 1;
            }
        }
    }
}

impl Module for Physics {
    fn name(&self) -> &'static str {
        "physics"
    }

    fn register_types_and_states(&mut self, db: &mut StateDb) {
        self.keys = Some((
            PhysicsKeys::register(db, &self.capacity),
            MeshKeys::register(db, self.capacity.mesh),
        ));
    }

    fn initialize(&mut self, _: &mut Platform) -> AppResult<()> {
        self.doomed
            .reserve(self.capacity.rigid_body.max(self.capacity.constraint));
        tracing::info!(gravity = ?self.config.gravity, "physics ready");
        Ok(())
    }

    fn update(&mut self, platform: &mut Platform, delta_time: f64) {
        let Some((keys, meshes)) = self.keys else {
            return;
        };
        let Platform { db, profiler, .. } = platform;
        let dt = delta_time as f32;

        profiler.section("physics.forces", || {
            Self::adopt_mesh_positions(db, keys, meshes);
            Self::apply_affectors(db, keys);
        });
        profiler.section("physics.integrate", || self.integrate(db, keys, dt));
        profiler.section("physics.constraints", || self.solve_constraints(db, keys));
        profiler.section("physics.sync", || self.sync_meshes(db, keys, meshes));
    }

    fn shutdown(&mut self, _: &mut Platform) {
        tracing::info!(
            destroyed_bodies = self.destroyed_bodies,
            destroyed_constraints = self.destroyed_constraints,
            "physics stopped"
        );
    }
}
