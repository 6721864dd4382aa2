//! # Scene
//!
//! Demo content on top of the renderer and physics types:
//!
//! - a camera looking at the origin
//! - a floating platform held up by a grid of buoyancy affectors
//! - falling bodies, some linked pairwise by distance constraints
//!
//! Meshes that fall below the despawn height are destroyed. Their rigid
//! bodies and constraints are left dangling on purpose; physics detects the
//! stale handles and cleans up after them.

use prototype_core::{ObjectHandle, StateDb, TypeId};
use prototype_shared::{Quaternion, Vec3};

use crate::assets::{AssetFlags, AssetHandle, Assets};
use crate::config::{CapacityConfig, PrototypeConfig, SceneConfig};
use crate::error::{AppError, AppResult};
use crate::module::{Module, Platform};
use crate::physics::{ConstraintInfo, PhysicsKeys, GROUND_GROUP};
use crate::renderer::{CameraKeys, MeshKeys};

/// Buoyancy spheres per platform side.
const PLATFORM_SPHERES: usize = 3;
/// Platform edge length.
const PLATFORM_SIZE: f32 = 8.0;
/// Platform mass.
const PLATFORM_MASS: f32 = 10.0;
/// Radius of each buoyancy sphere.
const SPHERE_RADIUS: f32 = 1.0;
/// Wave height around the mean water level.
const WAVE_AMPLITUDE: f32 = 0.25;
/// Spacing of linked body pairs.
const LINK_LENGTH: f32 = 3.0;

/// Deterministic spawn positions.
struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 32) as u32
    }

    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * (self.next_u32() as f32 / u32::MAX as f32)
    }

    fn vec3(&mut self, lo: Vec3, hi: Vec3) -> Vec3 {
        Vec3::new(
            self.range(lo.x, hi.x),
            self.range(lo.y, hi.y),
            self.range(lo.z, hi.z),
        )
    }
}

/// Volume of a sphere of `radius` below a surface, for a sphere whose bottom
/// is `depth` under it.
fn submerged_volume(depth: f32, radius: f32) -> f32 {
    let h = depth.clamp(0.0, 2.0 * radius);
    std::f32::consts::PI / 3.0 * h * h * (3.0 * radius - h)
}

#[derive(Clone, Copy)]
struct SceneKeys {
    meshes: MeshKeys,
    cameras: CameraKeys,
    physics: PhysicsKeys,
}

impl SceneKeys {
    fn populated_types(self) -> [TypeId; 5] {
        [
            self.physics.constraint,
            self.physics.affector,
            self.physics.rigid_body,
            self.cameras.camera,
            self.meshes.mesh,
        ]
    }
}

/// Scene module.
pub struct Scene {
    config: SceneConfig,
    capacity: CapacityConfig,
    gravity: f32,
    keys: Option<SceneKeys>,
    rng: Lcg,
    time: f64,
    camera: Option<ObjectHandle>,
    platform_mesh: Option<ObjectHandle>,
    buoyancy: Vec<ObjectHandle>,
    doomed: Vec<ObjectHandle>,
    despawned: u64,
}

impl Scene {
    /// Creates the module from the scene, capacity and gravity settings.
    #[must_use]
    pub fn new(config: &PrototypeConfig) -> Self {
        Self {
            config: config.scene.clone(),
            capacity: config.capacity.clone(),
            gravity: Vec3::from_array(config.physics.gravity).length(),
            keys: None,
            rng: Lcg(config.scene.seed),
            time: 0.0,
            camera: None,
            platform_mesh: None,
            buoyancy: Vec::new(),
            doomed: Vec::new(),
            despawned: 0,
        }
    }

    /// Meshes destroyed for falling below the despawn height.
    #[must_use]
    pub fn despawned(&self) -> u64 {
        self.despawned
    }

    /// Camera created at startup.
    #[must_use]
    pub fn camera(&self) -> Option<ObjectHandle> {
        self.camera
    }

    /// Mesh of the floating platform.
    #[must_use]
    pub fn platform_mesh(&self) -> Option<ObjectHandle> {
        self.platform_mesh
    }

    /// Buoyancy affectors of the platform.
    #[must_use]
    pub fn buoyancy_affectors(&self) -> &[ObjectHandle] {
        &self.buoyancy
    }

    fn spawn_mesh(
        db: &mut StateDb,
        keys: SceneKeys,
        at: Vec3,
        rotation: Quaternion,
        model: AssetHandle,
    ) -> AppResult<ObjectHandle> {
        let (mesh, info) = db.create(keys.meshes.info)?;
        info.translation = at;
        info.rotation = rotation;
        info.model_asset = model;
        info.visible = 1;
        Ok(mesh)
    }

    fn populate(&mut self, db: &mut StateDb, assets: &mut Assets, keys: SceneKeys) -> AppResult<()> {
        let (camera, view) = db.create(keys.cameras.info)?;
        view.position = Vec3::new(0.0, -60.0, 30.0);
        view.target = Vec3::new(0.0, 0.0, 5.0);
        self.camera = Some(camera);

        let platform_model = assets.asset("Assets/Platform.obj", AssetFlags::empty());
        let cube_model = assets.asset("Assets/Cube.obj", AssetFlags::empty());
        assets.asset("Procedural/Ocean", AssetFlags::PROCEDURAL | AssetFlags::DYNAMIC);

        let platform_mesh = Self::spawn_mesh(db, keys, Vec3::new(0.0, 0.0, 5.0), Quaternion::IDENTITY, platform_model)?;
        self.platform_mesh = Some(platform_mesh);
        let (platform_body, body) = db.create(keys.physics.body_info)?;
        body.mesh_handle = platform_mesh.to_bits();
        body.mass = PLATFORM_MASS;
        body.collision_group = 1;

        let step = PLATFORM_SIZE / (PLATFORM_SPHERES - 1) as f32;
        for col in 0..PLATFORM_SPHERES {
            for row in 0..PLATFORM_SPHERES {
                let (handle, affector) = db.create(keys.physics.affector_info)?;
                affector.rigid_body_handle = platform_body.to_bits();
                affector.force_position = Vec3::new(
                    -0.5 * PLATFORM_SIZE + col as f32 * step,
                    -0.5 * PLATFORM_SIZE + row as f32 * step,
                    0.0,
                );
                self.buoyancy.push(handle);
            }
        }

        let pairs = self.config.linked_pairs.min(self.config.falling_bodies / 2);
        let mut previous: Option<(ObjectHandle, Vec3)> = None;
        for i in 0..self.config.falling_bodies {
            let linked = i % 2 == 1 && i / 2 < pairs;
            let at = match previous {
                Some((_, anchor)) if linked => anchor + Vec3::new(LINK_LENGTH, 0.0, 0.0),
                _ => self.rng.vec3(Vec3::new(-30.0, -30.0, 20.0), Vec3::new(30.0, 30.0, 40.0)),
            };
            let axis = self.rng.vec3(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
            let rotation = Quaternion::from_axis_angle(axis, self.rng.range(0.0, std::f32::consts::TAU));

            let mesh = Self::spawn_mesh(db, keys, at, rotation, cube_model)?;
            let (handle, body) = db.create(keys.physics.body_info)?;
            body.mesh_handle = mesh.to_bits();
            body.mass = 1.0;
            body.velocity = Vec3::new(self.rng.range(-2.0, 2.0), self.rng.range(-2.0, 2.0), 0.0);
            body.collision_group = 1;
            body.collision_mask = GROUND_GROUP;

            if let Some((anchor, _)) = previous.filter(|_| linked) {
                let (_, constraint) = db.create(keys.physics.constraint_info)?;
                *constraint = ConstraintInfo::new(anchor, handle, LINK_LENGTH);
            }
            previous = Some((handle, at));
        }

        tracing::info!(
            falling_bodies = self.config.falling_bodies,
            linked_pairs = pairs,
            buoyancy_affectors = self.buoyancy.len(),
            "scene populated"
        );
        Ok(())
    }

    fn update_buoyancy(&self, db: &mut StateDb, keys: SceneKeys) {
        let time = self.time as f32;
        for &handle in &self.buoyancy {
            let Some(affector) = db.state(keys.physics.affector_info, handle).copied() else {
                continue;
            };
            let body = ObjectHandle::from_bits(affector.rigid_body_handle);
            let mesh = db
                .state(keys.physics.body_info, body)
                .map(|info| ObjectHandle::from_bits(info.mesh_handle))
                .and_then(|mesh| db.state(keys.meshes.info, mesh).copied());

            let force = mesh.map_or(Vec3::ZERO, |mesh| {
                let at = mesh.translation + mesh.rotation.rotate(affector.force_position);
                let surface = self.config.water_level + WAVE_AMPLITUDE * (0.5 * time + 0.3 * at.x + 0.2 * at.y).sin();
                let volume = submerged_volume(surface - at.z + SPHERE_RADIUS, SPHERE_RADIUS);
                Vec3::Z * (volume * self.config.water_density * self.gravity)
            });

            if let Some(row) = db.state_mut(keys.physics.affector_info, handle) {
                row.force = force;
                row.enabled = u32::from(force.z > 0.0);
            }
        }
    }

    fn despawn_fallen(&mut self, db: &mut StateDb, keys: SceneKeys) {
        self.doomed.clear();
        for info in db.full_state(keys.meshes.info) {
            if info.translation.z < self.config.despawn_below {
                if let Some(mesh) = db.handle_from_elem(keys.meshes.info, info) {
                    self.doomed.push(mesh);
                }
            }
        }
        for &mesh in &self.doomed {
            if db.destroy_object(mesh).is_ok() {
                self.despawned += 1;
            }
        }
        if !self.doomed.is_empty() {
            tracing::debug!(count = self.doomed.len(), "despawned fallen meshes");
        }
    }

    fn clear(&mut self, db: &mut StateDb, keys: SceneKeys) -> usize {
        let mut destroyed = 0;
        for ty in keys.populated_types() {
            while let Some(handle) = db.handle_at(ty, db.object_count(ty)) {
                if db.destroy_object(handle).is_err() {
                    break;
                }
                destroyed += 1;
            }
        }
        self.buoyancy.clear();
        self.camera = None;
        self.platform_mesh = None;
        destroyed
    }
}

impl Module for Scene {
    fn name(&self) -> &'static str {
        "scene"
    }

    fn register_types_and_states(&mut self, db: &mut StateDb) {
        self.keys = Some(SceneKeys {
            meshes: MeshKeys::register(db, self.capacity.mesh),
            cameras: CameraKeys::register(db, self.capacity.camera),
            physics: PhysicsKeys::register(db, &self.capacity),
        });
    }

    fn initialize(&mut self, platform: &mut Platform) -> AppResult<()> {
        let Some(keys) = self.keys else {
            return Err(AppError::ModuleInit {
                module: "scene",
                reason: "types were not registered".to_owned(),
            });
        };
        self.doomed.reserve(self.capacity.mesh);
        let Platform { db, assets, .. } = platform;
        if let Err(err) = self.populate(db, assets, keys) {
            self.clear(db, keys);
            return Err(err);
        }
        Ok(())
    }

    fn update(&mut self, platform: &mut Platform, delta_time: f64) {
        let Some(keys) = self.keys else {
            return;
        };
        self.time += delta_time;
        let Platform { db, profiler, .. } = platform;
        profiler.section("scene.buoyancy", || self.update_buoyancy(db, keys));
        profiler.section("scene.despawn", || self.despawn_fallen(db, keys));
    }

    fn shutdown(&mut self, platform: &mut Platform) {
        let Some(keys) = self.keys else {
            return;
        };
        let destroyed = self.clear(&mut platform.db, keys);
        tracing::info!(despawned = self.despawned, destroyed, "scene cleared");
    }
}
