//! Haze Core - renderer-agnostic data for the Haze path tracer.
//!
//! This crate provides:
//!
//! - **Geometry**: `Mesh` (positions, per-vertex normals, triangle indices)
//! - **Settings**: `TracerSettings` and `FogSettings`, loadable from JSON
//! - **Errors**: `CoreError`
//!
//! # Example
//!
//! ```ignore
//! use haze_core::TracerSettings;
//!
//! let settings = TracerSettings::from_json_file("render.json")?;
//! println!("{} spp, depth {}", settings.ns_aa, settings.max_ray_depth);
//! ```

pub mod error;
pub mod mesh;
pub mod settings;

// Re-export commonly used types
pub use error::{CoreError, CoreResult};
pub use mesh::Mesh;
pub use settings::{FogSettings, TracerSettings};
