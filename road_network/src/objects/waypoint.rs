use std::fmt;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};

use geom::Pt3D;

use crate::raw::RawWaypoint;
use crate::{RoadNetwork, SegmentID};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaypointID(pub usize);

impl fmt::Display for WaypointID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Waypoint #{}", self.0)
    }
}

/// A named point that segments start at, end at, or curve through.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: WaypointID,
    pub name: String,
    // Only the network may move a waypoint, since segment splines are built from positions.
    pub(crate) position: Pt3D,

    pub traffic_light: Option<String>,
    pub head_light_intensity: Option<f64>,
    pub turn_signal: Option<String>,
    pub brake_light_on: Option<bool>,
    pub waiting_time: Option<Duration>,

    /// In declaration order. Order matters for preferred matches and the fallback when picking
    /// the next segment.
    pub(crate) outgoing: Vec<SegmentID>,
    /// Every segment curving through this waypoint.
    pub(crate) parents: Vec<SegmentID>,
}

impl Waypoint {
    pub(crate) fn new(id: WaypointID, raw: &RawWaypoint, outgoing: Vec<SegmentID>) -> Waypoint {
        Waypoint {
            id,
            name: raw.id.clone(),
            position: raw.position,
            traffic_light: raw.traffic_light.clone(),
            head_light_intensity: raw.head_light_intensity,
            turn_signal: raw.turn_signal.clone(),
            brake_light_on: raw.brake_light_on,
            waiting_time: raw.waiting_time_ms.map(Duration::from_millis),
            outgoing,
            parents: Vec::new(),
        }
    }

    pub fn pos(&self) -> Pt3D {
        self.position
    }

    pub fn outgoing_segments(&self) -> &Vec<SegmentID> {
        &self.outgoing
    }

    pub fn parent_segments(&self) -> &Vec<SegmentID> {
        &self.parents
    }

    /// Paths can't continue from here.
    pub fn is_end_point(&self) -> bool {
        self.outgoing.is_empty()
    }

    pub fn is_via_wp(&self) -> bool {
        !self.parents.is_empty()
    }

    /// Picks where to go from here. The first outgoing segment that's also in `preferred` always
    /// wins. Otherwise the choice is random, weighted by each segment's probability. None at an
    /// end point.
    pub fn next_segment(
        &self,
        map: &RoadNetwork,
        preferred: &[SegmentID],
        rng: &mut XorShiftRng,
    ) -> Option<SegmentID> {
        let last = *self.outgoing.last()?;

        if let Some(s) = self.outgoing.iter().find(|s| preferred.contains(s)) {
            return Some(*s);
        }

        let total: f64 = self
            .outgoing
            .iter()
            .map(|s| map.get_s(*s).probability)
            .sum();
        if total <= 0.0 {
            return Some(last);
        }

        let draw: f64 = rng.gen();
        let mut sum = 0.0;
        for s in &self.outgoing {
            sum += map.get_s(*s).probability / total;
            if sum > draw {
                return Some(*s);
            }
        }
        // Rounding can leave the running sum just short of the draw
        Some(last)
    }

    /// When this waypoint has to stand in for a path start, traffic really begins at one of the
    /// segments curving through it.
    pub fn random_parent_segment(&self, rng: &mut XorShiftRng) -> Option<SegmentID> {
        self.parents.choose(rng).cloned()
    }

    pub(crate) fn add_parent_segment(&mut self, s: SegmentID) {
        if !self.parents.contains(&s) {
            self.parents.push(s);
        }
    }

    pub(crate) fn remove_parent_segment(&mut self, s: SegmentID) {
        self.parents.retain(|x| *x != s);
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.position)
    }
}
