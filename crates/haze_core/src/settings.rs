//! Render settings for the path tracer.
//!
//! Every field has a default, so a settings file only needs to list what it
//! overrides:
//!
//! ```json
//! { "max_ray_depth": 8, "ns_aa": 256, "fog": { "enabled": true } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Path tracer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerSettings {
    /// Bounce budget given to camera rays
    pub max_ray_depth: u32,

    /// Maximum camera samples per pixel
    pub ns_aa: u32,

    /// Samples taken between adaptive convergence checks
    pub samples_per_batch: u32,

    /// Stop sampling a pixel once the 95% confidence half-width drops below
    /// `max_tolerance * mean` (0 disables adaptive sampling)
    pub max_tolerance: f32,

    /// Light samples per area light at each shading point
    pub ns_area_light: u32,

    /// Use uniform hemisphere sampling instead of light importance sampling
    pub direct_hemisphere_sample: bool,

    /// Add direct lighting at every bounce, not only the last one
    pub accumulate_bounces: bool,

    /// Russian roulette termination probability per bounce (0 = never)
    pub russian_roulette: f32,

    /// Maximum primitives per BVH leaf
    pub max_leaf_size: usize,

    /// Constant ambient radiance added to every surface hit
    pub ambient: [f32; 3],

    /// Base seed for per-pixel random streams
    pub seed: u64,

    /// Display gamma used when converting to 8-bit output
    pub gamma: f32,

    /// Participating media approximation
    pub fog: FogSettings,
}

impl Default for TracerSettings {
    fn default() -> Self {
        Self {
            max_ray_depth: 5,
            ns_aa: 64,
            samples_per_batch: 32,
            max_tolerance: 0.05,
            ns_area_light: 4,
            direct_hemisphere_sample: false,
            accumulate_bounces: true,
            russian_roulette: 0.0,
            max_leaf_size: 4,
            ambient: [0.02, 0.02, 0.02],
            seed: 0,
            gamma: 2.2,
            fog: FogSettings::default(),
        }
    }
}

impl TracerSettings {
    /// Parse settings from a JSON string and validate them.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file and validate them.
    pub fn from_json_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&text)?;
        log::info!("Loaded tracer settings from {}", path.display());
        Ok(settings)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check ranges the renderer relies on.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_leaf_size == 0 {
            return Err(invalid("max_leaf_size", "must be at least 1"));
        }
        if self.ns_aa == 0 {
            return Err(invalid("ns_aa", "must be at least 1"));
        }
        if self.samples_per_batch == 0 {
            return Err(invalid("samples_per_batch", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.russian_roulette) {
            return Err(invalid(
                "russian_roulette",
                format!("{} is not a probability", self.russian_roulette),
            ));
        }
        if !(self.max_tolerance >= 0.0) {
            return Err(invalid("max_tolerance", "must be non-negative"));
        }
        if !(self.gamma > 0.0) {
            return Err(invalid("gamma", "must be positive"));
        }
        if self.ambient.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(invalid("ambient", "components must be finite and non-negative"));
        }
        self.fog.validate()
    }
}

/// Settings for the ray-marched fog approximation.
///
/// None of these constants are physically derived; they shape how the fog
/// looks, not how accurately it converges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogSettings {
    pub enabled: bool,

    /// Distance between density samples along the camera ray
    pub step: f32,

    /// Spatial frequency of the noise density field
    pub frequency: f32,

    /// Scattering coefficient turning density into a per-step hit probability
    pub sigma_s: f32,

    /// Falloff coefficient for light attenuation toward the light
    pub absorption: f32,

    /// Samples below this height are fog-free (None = fog everywhere)
    pub height_floor: Option<f32>,

    /// Upper bound on how far the attenuation march walks toward a light
    pub max_light_march: f32,

    /// Upper bound on density samples along one camera ray
    pub max_march_steps: usize,

    /// Single-scattering albedo of the fog phase function
    pub albedo: f32,

    /// Per-channel tint applied to scattered light (bluish sky-like scattering)
    pub rayleigh_tint: [f32; 3],

    /// Seed of the noise field
    pub noise_seed: u32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            step: 0.05,
            frequency: 2.5,
            sigma_s: 0.002,
            absorption: 0.2,
            height_floor: None,
            max_light_march: 20.0,
            max_march_steps: 1 << 16,
            albedo: 0.2,
            rayleigh_tint: [0.83, 1.0, 1.2],
            noise_seed: 0,
        }
    }
}

impl FogSettings {
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.step > 0.0) {
            return Err(invalid("fog.step", "must be positive"));
        }
        if !(self.sigma_s >= 0.0) || !(self.absorption >= 0.0) {
            return Err(invalid("fog", "coefficients must be non-negative"));
        }
        if !(self.max_light_march > 0.0) {
            return Err(invalid("fog.max_light_march", "must be positive"));
        }
        if self.max_march_steps == 0 {
            return Err(invalid("fog.max_march_steps", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidSetting {
        name,
        reason: reason.into(),
    }
}
