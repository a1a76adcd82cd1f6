use serde::{Deserialize, Serialize};

use crate::{Distance, Pt3D};

/// Stop bisecting a Catmull-Rom piece once the chord and the two half-chords agree this closely,
/// in meters.
const CATMULL_ROM_LENGTH_EPSILON: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplineType {
    /// Straight lines between consecutive control points.
    Linear,
    /// A cardinal curve passing through every control point, shaped by the curve tension.
    CatmullRom,
}

/// A curve through an ordered list of control points. Between each pair of consecutive control
/// points is one sub-segment, and the arc length of every sub-segment is cached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    control_pts: Vec<Pt3D>,
    spline_type: SplineType,
    curve_tension: f64,

    // Derived from the above. Plain f64 instead of Distance, because walking along the spline
    // shouldn't accumulate the rounding that Distance applies.
    segment_lengths: Vec<f64>,
    total_length: f64,
}

impl Spline {
    pub fn new(spline_type: SplineType, curve_tension: f64, control_pts: Vec<Pt3D>) -> Spline {
        let mut spline = Spline {
            control_pts,
            spline_type,
            curve_tension,
            segment_lengths: Vec::new(),
            total_length: 0.0,
        };
        spline.compute_lengths();
        spline
    }

    pub fn linear(control_pts: Vec<Pt3D>) -> Spline {
        Spline::new(SplineType::Linear, 0.0, control_pts)
    }

    pub fn catmull_rom(control_pts: Vec<Pt3D>, curve_tension: f64) -> Spline {
        Spline::new(SplineType::CatmullRom, curve_tension, control_pts)
    }

    pub fn control_points(&self) -> &Vec<Pt3D> {
        &self.control_pts
    }

    /// How many sub-segments there are; one less than the number of control points.
    pub fn num_segments(&self) -> usize {
        self.segment_lengths.len()
    }

    pub fn segment_lengths(&self) -> Vec<Distance> {
        self.segment_lengths
            .iter()
            .map(|l| Distance::meters(*l))
            .collect()
    }

    pub fn total_length(&self) -> Distance {
        Distance::meters(self.total_length)
    }

    /// Finds the sub-segment containing a distance (in meters) from the start of the spline, and
    /// the fractional position within that sub-segment. Distances past the end resolve to the end
    /// of the last sub-segment. None if there are no sub-segments.
    pub fn locate(&self, dist: f64) -> Option<(usize, f64)> {
        let last = self.segment_lengths.len().checked_sub(1)?;
        let mut sum = 0.0;
        for (idx, len) in self.segment_lengths.iter().enumerate() {
            if sum + len >= dist {
                let local = if *len > 0.0 {
                    ((dist - sum) / len).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                return Some((idx, local));
            }
            sum += len;
        }
        Some((last, 1.0))
    }

    /// Evaluates sub-segment `idx` at `u` in [0, 1]. `u = 0` is control point `idx`, and `u = 1`
    /// is control point `idx + 1`.
    pub fn interpolate(&self, u: f64, idx: usize) -> Pt3D {
        match self.spline_type {
            SplineType::Linear => self.control_pts[idx].lerp(self.control_pts[idx + 1], u),
            SplineType::CatmullRom => {
                let [p0, p1, p2, p3] = self.catmull_rom_window(idx);
                catmull_rom_point(u, self.curve_tension, p0, p1, p2, p3)
            }
        }
    }

    /// The point at some distance along the whole spline, clamped to the ends.
    pub fn dist_along(&self, dist: Distance) -> Option<Pt3D> {
        let (idx, u) = self.locate(dist.inner_meters())?;
        Some(self.interpolate(u, idx))
    }

    /// Points along the spline for drawing. Linear splines just return their control points;
    /// curved ones are evaluated `subdivisions` times per sub-segment.
    pub fn sample(&self, subdivisions: usize) -> Vec<Pt3D> {
        if self.spline_type == SplineType::Linear || subdivisions == 0 || self.num_segments() == 0
        {
            return self.control_pts.clone();
        }
        let mut pts = Vec::new();
        for idx in 0..self.num_segments() {
            for step in 0..subdivisions {
                pts.push(self.interpolate(step as f64 / subdivisions as f64, idx));
            }
        }
        pts.extend(self.control_pts.last().cloned());
        pts
    }

    fn compute_lengths(&mut self) {
        self.segment_lengths.clear();
        if self.control_pts.len() >= 2 {
            for idx in 0..self.control_pts.len() - 1 {
                let len = match self.spline_type {
                    SplineType::Linear => {
                        (self.control_pts[idx + 1] - self.control_pts[idx]).length()
                    }
                    SplineType::CatmullRom => {
                        let [p0, p1, p2, p3] = self.catmull_rom_window(idx);
                        catmull_rom_length(p0, p1, p2, p3, 0.0, 1.0, self.curve_tension)
                    }
                };
                self.segment_lengths.push(len);
            }
        }
        self.total_length = self.segment_lengths.iter().sum();
    }

    // The four points shaping sub-segment idx. The ends are padded by reflecting the neighboring
    // control point, so the curve still passes through the first and last points.
    fn catmull_rom_window(&self, idx: usize) -> [Pt3D; 4] {
        let pts = &self.control_pts;
        let p1 = pts[idx];
        let p2 = pts[idx + 1];
        let p0 = if idx == 0 { p1 - (p2 - p1) } else { pts[idx - 1] };
        let p3 = if idx + 2 < pts.len() {
            pts[idx + 2]
        } else {
            p2 + (p2 - p1)
        };
        [p0, p1, p2, p3]
    }
}

fn catmull_rom_point(u: f64, tension: f64, p0: Pt3D, p1: Pt3D, p2: Pt3D, p3: Pt3D) -> Pt3D {
    let t = tension;
    let c1 = p1;
    let c2 = (p2 - p0) * t;
    let c3 = p0 * (2.0 * t) + p1 * (t - 3.0) + p2 * (3.0 - 2.0 * t) - p3 * t;
    let c4 = p0 * -t + p1 * (2.0 - t) + p2 * (t - 2.0) + p3 * t;
    ((c4 * u + c3) * u + c2) * u + c1
}

// Adaptive bisection: keep splitting while the chord is noticeably shorter than the path through
// the midpoint.
fn catmull_rom_length(
    p0: Pt3D,
    p1: Pt3D,
    p2: Pt3D,
    p3: Pt3D,
    start: f64,
    end: f64,
    tension: f64,
) -> f64 {
    let start_pt = if start == 0.0 {
        p1
    } else {
        catmull_rom_point(start, tension, p0, p1, p2, p3)
    };
    let end_pt = if end == 1.0 {
        p2
    } else {
        catmull_rom_point(end, tension, p0, p1, p2, p3)
    };
    let middle = (start + end) * 0.5;
    let middle_pt = catmull_rom_point(middle, tension, p0, p1, p2, p3);

    let chord = (end_pt - start_pt).length();
    let halves = (middle_pt - start_pt).length() + (end_pt - middle_pt).length();
    if chord + CATMULL_ROM_LENGTH_EPSILON < halves {
        catmull_rom_length(p0, p1, p2, p3, start, middle, tension)
            + catmull_rom_length(p0, p1, p2, p3, middle, end, tension)
    } else {
        halves
    }
}
