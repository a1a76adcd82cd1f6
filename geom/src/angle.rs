use std::f64::consts::TAU;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An angle, stored in radians. Always normalized to [0, 2pi).
///
/// When used as a heading on the ground plane, 0 faces -Z and the angle grows clockwise when
/// viewed from above, so pi/2 faces +X.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn new_rads(rads: f64) -> Angle {
        if !rads.is_finite() {
            panic!("Bad Angle {}", rads);
        }
        let normalized = rads.rem_euclid(TAU);
        // rem_euclid of a tiny negative value rounds up to exactly 2pi
        if normalized >= TAU {
            Angle(0.0)
        } else {
            Angle(normalized)
        }
    }

    pub fn degrees(degs: f64) -> Angle {
        Angle::new_rads(degs.to_radians())
    }

    /// The heading of a direction on the ground plane, given its X and Z components. A zero-length
    /// direction has heading 0.
    pub fn heading_of(dx: f64, dz: f64) -> Angle {
        if dx == 0.0 && dz == 0.0 {
            return Angle::ZERO;
        }
        Angle::new_rads(dx.atan2(-dz))
    }

    pub fn normalized_radians(self) -> f64 {
        self.0
    }

    pub fn normalized_degrees(self) -> f64 {
        self.0.to_degrees()
    }

    /// The smallest rotation, in degrees, between two angles. Always in [0, 180].
    pub fn degrees_apart(self, other: Angle) -> f64 {
        let diff = (self.0 - other.0).abs();
        diff.min(TAU - diff).to_degrees()
    }

    /// True if the two angles are within some degrees of each other, handling wraparound.
    pub fn approx_eq(self, other: Angle, within_degrees: f64) -> bool {
        self.degrees_apart(other) < within_degrees
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}
