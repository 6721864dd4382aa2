//! # Prototype
//!
//! The headless application, integrating all modules over one state store.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Platform                            │
//! │   StateDb (types, states, objects)   Assets   FrameProfiler  │
//! └──────────────▲──────────────────▲──────────────────▲─────────┘
//!                │                  │                  │
//!        ┌───────┴──────┐   ┌───────┴──────┐   ┌───────┴──────┐
//!        │   Physics    │   │    Scene     │   │   Renderer   │
//!        │ RigidBody    │   │ buoyancy     │   │ Mesh, Camera │
//!        │ Affector     │   │ spawning     │   │ draw list    │
//!        │ Constraint   │   │ despawning   │   │              │
//!        └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! Modules never call each other. They reference each other's objects by
//! [`ObjectHandle`](prototype_core::ObjectHandle) stored in state rows and
//! re-validate those handles every frame.
//!
//! ## Modules
//!
//! - `module`: Module trait, platform context, application driver
//! - `renderer`: Meshes, cameras, per-frame draw list
//! - `physics`: Rigid bodies, affectors, distance constraints
//! - `scene`: Demo content and buoyancy
//! - `assets`: Asset name interning
//! - `profiling`: Per-frame section timings
//! - `config`: TOML configuration

#![deny(unsafe_code)]

pub mod assets;
pub mod config;
pub mod error;
pub mod module;
pub mod physics;
pub mod profiling;
pub mod renderer;
pub mod scene;

pub use prototype_core as core;
pub use prototype_shared as shared;

pub use assets::{AssetFlags, AssetHandle, Assets};
pub use config::PrototypeConfig;
pub use error::{AppError, AppResult};
pub use module::{App, Module, Platform};
pub use physics::Physics;
pub use profiling::FrameProfiler;
pub use renderer::Renderer;
pub use scene::Scene;
