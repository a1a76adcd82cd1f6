//! Units and geometry for the road network. Everything is in world-space meters, with Y pointing
//! up, so the ground plane is X/Z.

mod angle;
mod distance;
mod pt;
mod speed;
mod spline;

pub use crate::angle::Angle;
pub use crate::distance::Distance;
pub use crate::pt::Pt3D;
pub use crate::speed::Speed;
pub use crate::spline::{Spline, SplineType};

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading). Ideally we'd use some kind of proper
/// fixed-precision type instead of f64.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
