use std::{fmt, ops};

use serde::{Deserialize, Serialize};

use crate::Distance;

/// A point in world-space meters. Y points up. Also doubles as a direction vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt3D {
    x: f64,
    y: f64,
    z: f64,
}

impl Pt3D {
    pub fn new(x: f64, y: f64, z: f64) -> Pt3D {
        if !x.is_finite() || !y.is_finite() || !z.is_finite() {
            panic!("Bad Pt3D {}, {}, {}", x, y, z);
        }
        Pt3D { x, y, z }
    }

    pub fn origin() -> Pt3D {
        Pt3D::new(0.0, 0.0, 0.0)
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn z(self) -> f64 {
        self.z
    }

    pub fn dist_to(self, other: Pt3D) -> Distance {
        Distance::meters((self - other).length())
    }

    /// Projects onto the ground plane.
    pub fn flatten_y(self) -> Pt3D {
        Pt3D::new(self.x, 0.0, self.z)
    }

    /// Treating this as a vector, its Euclidean length.
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// A unit vector in the same direction. The zero vector stays zero.
    pub fn normalize(self) -> Pt3D {
        let len = self.length();
        if len == 0.0 {
            return self;
        }
        self * (1.0 / len)
    }

    pub fn dot(self, other: Pt3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// The unsigned angle between two unit vectors, in radians [0, pi]. This can't tell clockwise
    /// from counter-clockwise.
    pub fn angle_between(self, other: Pt3D) -> f64 {
        self.dot(other).clamp(-1.0, 1.0).acos()
    }

    /// Linear interpolation; `t = 0` is self, `t = 1` is other.
    pub fn lerp(self, other: Pt3D, t: f64) -> Pt3D {
        self + (other - self) * t
    }

    pub fn approx_eq(self, other: Pt3D, threshold: Distance) -> bool {
        (self - other).length() <= threshold.inner_meters()
    }
}

impl fmt::Display for Pt3D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl ops::Add for Pt3D {
    type Output = Pt3D;

    fn add(self, other: Pt3D) -> Pt3D {
        Pt3D::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl ops::Sub for Pt3D {
    type Output = Pt3D;

    fn sub(self, other: Pt3D) -> Pt3D {
        Pt3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl ops::Mul<f64> for Pt3D {
    type Output = Pt3D;

    fn mul(self, scalar: f64) -> Pt3D {
        Pt3D::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Default for Pt3D {
    fn default() -> Pt3D {
        Pt3D::origin()
    }
}
