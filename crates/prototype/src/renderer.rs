//! # Renderer (headless)
//!
//! Owns the `Mesh` and `Camera` types. Each frame it walks the packed
//! `Mesh::Info` rows and produces a [`DrawList`]; a GPU backend would consume
//! that list, here it is kept for inspection.

use bytemuck::{Pod, Zeroable};
use prototype_core::{ObjectHandle, StateDb, StateKey, TypeId};
use prototype_shared::{Quaternion, Vec3};

use crate::assets::AssetHandle;
use crate::config::CapacityConfig;
use crate::error::AppResult;
use crate::module::{Module, Platform};

/// `Mesh::Info` row.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshInfo {
    /// World-space position
    pub translation: Vec3,
    /// Model to draw
    pub model_asset: AssetHandle,
    /// World-space orientation
    pub rotation: Quaternion,
    /// Non-zero if the mesh is drawn
    pub visible: u32,
}

/// `Camera::Info` row.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CameraInfo {
    /// Eye position
    pub position: Vec3,
    /// Look-at point
    pub target: Vec3,
}

/// Registered ids of the `Mesh` type.
///
/// Other modules call [`MeshKeys::register`] with the same capacity to get
/// access to mesh rows.
#[derive(Clone, Copy, Debug)]
pub struct MeshKeys {
    /// `Mesh`
    pub mesh: TypeId,
    /// `Mesh::Info`
    pub info: StateKey<MeshInfo>,
}

impl MeshKeys {
    /// Registers (or looks up) the `Mesh` type and its state.
    pub fn register(db: &mut StateDb, capacity: usize) -> Self {
        let mesh = db.register_type("Mesh", capacity);
        Self {
            mesh,
            info: db.register_state(mesh, "Info"),
        }
    }
}

/// Registered ids of the `Camera` type.
#[derive(Clone, Copy, Debug)]
pub struct CameraKeys {
    /// `Camera`
    pub camera: TypeId,
    /// `Camera::Info`
    pub info: StateKey<CameraInfo>,
}

impl CameraKeys {
    /// Registers (or looks up) the `Camera` type and its state.
    pub fn register(db: &mut StateDb, capacity: usize) -> Self {
        let camera = db.register_type("Camera", capacity);
        Self {
            camera,
            info: db.register_state(camera, "Info"),
        }
    }
}

/// One visible mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    /// Mesh the call was built from
    pub mesh: ObjectHandle,
    /// Model to draw
    pub model_asset: AssetHandle,
    /// World-space position
    pub translation: Vec3,
    /// World-space orientation
    pub rotation: Quaternion,
}

/// Eye and target of the camera a frame is drawn from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    /// Eye position
    pub eye: Vec3,
    /// Look-at point
    pub target: Vec3,
}

/// Everything needed to draw one frame.
#[derive(Debug, Default)]
pub struct DrawList {
    /// Camera view, if any camera is live
    pub view: Option<View>,
    /// Visible meshes in dense order
    pub calls: Vec<DrawCall>,
}

/// Headless renderer module.
pub struct Renderer {
    capacity: CapacityConfig,
    keys: Option<(MeshKeys, CameraKeys)>,
    active_camera: Option<ObjectHandle>,
    draw_list: DrawList,
}

impl Renderer {
    /// Creates the renderer; capacities size the `Mesh` and `Camera` types.
    #[must_use]
    pub fn new(capacity: CapacityConfig) -> Self {
        Self {
            capacity,
            keys: None,
            active_camera: None,
            draw_list: DrawList::default(),
        }
    }

    /// Draws from `camera` until it is destroyed.
    ///
    /// Without an active camera the first live camera is used.
    pub fn set_active_camera(&mut self, camera: ObjectHandle) {
        self.active_camera = Some(camera);
    }

    /// Camera drawn from in the last frame.
    #[must_use]
    pub fn active_camera(&self) -> Option<ObjectHandle> {
        self.active_camera
    }

    /// Output of the last frame.
    #[must_use]
    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    fn resolve_view(&mut self, db: &StateDb, cameras: CameraKeys) -> Option<View> {
        if let Some(camera) = self.active_camera {
            if db.state(cameras.info, camera).is_none() {
                tracing::warn!(%camera, "active camera is stale, dropping it");
                self.active_camera = None;
            }
        }
        if self.active_camera.is_none() {
            self.active_camera = db.handle_at(cameras.camera, 1);
        }
        let info = db.state(cameras.info, self.active_camera?)?;
        Some(View {
            eye: info.position,
            target: info.target,
        })
    }
}

impl Module for Renderer {
    fn name(&self) -> &'static str {
        "renderer"
    }

    fn register_types_and_states(&mut self, db: &mut StateDb) {
        self.keys = Some((
            MeshKeys::register(db, self.capacity.mesh),
            CameraKeys::register(db, self.capacity.camera),
        ));
    }

    fn initialize(&mut self, _: &mut Platform) -> AppResult<()> {
        self.draw_list.calls.reserve(self.capacity.mesh);
        Ok(())
    }

    fn update(&mut self, platform: &mut Platform, _: f64) {
        let Some((meshes, cameras)) = self.keys else {
            return;
        };
        let db = &platform.db;

        self.draw_list.view = self.resolve_view(db, cameras);
        self.draw_list.calls.clear();
        self.draw_list.calls.extend(
            db.iter_with_handles(meshes.info)
                .filter(|(_, info)| info.visible != 0)
                .map(|(mesh, info)| DrawCall {
                    mesh,
                    model_asset: info.model_asset,
                    translation: info.translation,
                    rotation: info.rotation,
                }),
        );
    }

    fn shutdown(&mut self, _: &mut Platform) {
        tracing::info!(
            draw_calls = self.draw_list.calls.len(),
            has_view = self.draw_list.view.is_some(),
            "renderer last frame"
        );
        self.draw_list = DrawList::default();
        self.active_camera = None;
    }
}
