use std::{cmp, fmt};

use serde::{Deserialize, Serialize};

use crate::trim_f64;

/// In meters per second. Can be negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Speed(f64);

// By construction, Speed is a finite f64 with trimmed precision.
impl Eq for Speed {}

#[allow(clippy::derive_ord_xor_partial_ord)] // false positive
impl Ord for Speed {
    fn cmp(&self, other: &Speed) -> cmp::Ordering {
        self.partial_cmp(other).unwrap()
    }
}

impl Speed {
    pub const ZERO: Speed = Speed::const_meters_per_second(0.0);

    pub fn meters_per_second(value: f64) -> Speed {
        if !value.is_finite() {
            panic!("Bad Speed {}", value);
        }

        Speed(trim_f64(value))
    }

    pub const fn const_meters_per_second(value: f64) -> Speed {
        Speed(value)
    }

    pub fn km_per_hour(value: f64) -> Speed {
        Speed::meters_per_second(value / 3.6)
    }

    pub fn to_km_per_hour(self) -> f64 {
        self.0 * 3.6
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} km/h", (self.to_km_per_hour() * 10.0).round() / 10.0)
    }
}

impl Default for Speed {
    fn default() -> Speed {
        Speed::ZERO
    }
}
