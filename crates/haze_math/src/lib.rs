// Re-export glam for convenience
pub use glam::*;

// Haze math types
mod bbox;
mod frame;
mod ray;

pub use bbox::BBox;
pub use frame::Frame;
pub use ray::{Ray, EPS_F};
