use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use geom::{Angle, Distance, Pt3D, Speed, Spline};

use crate::raw::RawSegment;
use crate::{AgentID, DrivingSide, OccupancyConfig, TrafficView, Waypoint, WaypointID};

/// Curved segments are drawn with this many points per sub-segment.
const CURVE_SUBDIVISIONS: usize = 10;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentID(pub usize);

impl fmt::Display for SegmentID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Segment #{}", self.0)
    }
}

/// A directed path from one waypoint to another, maybe curving through some via waypoints.
///
/// The references to other objects start as names. They're resolved when the network initializes
/// the segment; names that don't match anything just stay unresolved. Until both ends resolve,
/// the segment has no geometry, and every geometric query returns something neutral.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentID,
    pub name: String,

    pub from_name: String,
    pub via_names: Vec<String>,
    pub to_name: String,
    pub left_neighbor_name: Option<String>,
    pub right_neighbor_name: Option<String>,

    pub(crate) from: Option<WaypointID>,
    /// Only the via waypoints that resolved, in declared order.
    pub(crate) via: Vec<WaypointID>,
    pub(crate) to: Option<WaypointID>,
    pub(crate) left_neighbor: Option<SegmentID>,
    pub(crate) right_neighbor: Option<SegmentID>,

    pub speed: Speed,
    /// Traffic teleports to the end instead of driving along.
    pub is_jump: bool,
    /// Unnormalized weight for picking this segment among the others leaving the same waypoint.
    pub probability: f64,
    /// Names of segments that have right-of-way over this one.
    pub priority_list: Vec<String>,
    pub curve_tension: f64,

    initialized: bool,
    spline: Option<Spline>,
    // Handed off once, when an agent enters somewhere in the middle.
    traveled_distance_overrides: BTreeMap<AgentID, Distance>,
}

impl Segment {
    pub(crate) fn new(id: SegmentID, raw: &RawSegment) -> Segment {
        Segment {
            id,
            name: raw.id.clone(),
            from_name: raw.from.clone(),
            via_names: raw.via.clone(),
            to_name: raw.to.clone(),
            left_neighbor_name: raw.left_neighbor.clone(),
            right_neighbor_name: raw.right_neighbor.clone(),

            from: None,
            via: Vec::new(),
            to: None,
            left_neighbor: None,
            right_neighbor: None,

            speed: Speed::km_per_hour(raw.speed_kmh),
            is_jump: raw.jump,
            probability: raw.probability,
            priority_list: raw.give_way_to.clone(),
            curve_tension: raw.curve_tension,

            initialized: false,
            spline: None,
            traveled_distance_overrides: BTreeMap::new(),
        }
    }

    /// Resolves names and rebuilds the spline. Safe to repeat; via registrations from the
    /// previous run are undone first.
    pub(crate) fn init(
        &mut self,
        waypoint_names: &BTreeMap<String, WaypointID>,
        waypoints: &mut [Waypoint],
        segment_names: &BTreeMap<String, SegmentID>,
    ) {
        for w in self.via.drain(..) {
            waypoints[w.0].remove_parent_segment(self.id);
        }

        self.from = waypoint_names.get(&self.from_name).cloned();
        self.to = waypoint_names.get(&self.to_name).cloned();
        self.left_neighbor = self
            .left_neighbor_name
            .as_ref()
            .and_then(|n| segment_names.get(n))
            .cloned();
        self.right_neighbor = self
            .right_neighbor_name
            .as_ref()
            .and_then(|n| segment_names.get(n))
            .cloned();

        self.spline = None;
        if let (Some(from), Some(to)) = (self.from, self.to) {
            let mut pts = vec![waypoints[from.0].position];
            for name in &self.via_names {
                if let Some(w) = waypoint_names.get(name) {
                    waypoints[w.0].add_parent_segment(self.id);
                    self.via.push(*w);
                    pts.push(waypoints[w.0].position);
                }
            }
            pts.push(waypoints[to.0].position);

            self.spline = Some(if self.via.is_empty() {
                Spline::linear(pts)
            } else {
                Spline::catmull_rom(pts, self.curve_tension)
            });
        }

        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Both ends resolved, so there's a spline to query.
    pub fn has_geometry(&self) -> bool {
        self.spline.is_some()
    }

    pub fn spline(&self) -> Option<&Spline> {
        self.spline.as_ref()
    }

    pub fn from(&self) -> Option<WaypointID> {
        self.from
    }

    pub fn to(&self) -> Option<WaypointID> {
        self.to
    }

    pub fn via_waypoints(&self) -> &Vec<WaypointID> {
        &self.via
    }

    pub fn has_via_waypoints(&self) -> bool {
        !self.via.is_empty()
    }

    pub fn left_neighbor(&self) -> Option<SegmentID> {
        self.left_neighbor
    }

    pub fn right_neighbor(&self) -> Option<SegmentID> {
        self.right_neighbor
    }

    /// The neighbor used for overtaking.
    pub fn passing_neighbor(&self, side: DrivingSide) -> Option<SegmentID> {
        match side {
            DrivingSide::Right => self.left_neighbor,
            DrivingSide::Left => self.right_neighbor,
        }
    }

    /// The neighbor to return to after overtaking.
    pub fn regular_neighbor(&self, side: DrivingSide) -> Option<SegmentID> {
        match side {
            DrivingSide::Right => self.right_neighbor,
            DrivingSide::Left => self.left_neighbor,
        }
    }

    pub fn yields_to(&self, segment: &str) -> bool {
        self.priority_list.iter().any(|s| s == segment)
    }

    pub fn num_curve_subdivisions(&self) -> usize {
        if self.has_via_waypoints() {
            CURVE_SUBDIVISIONS
        } else {
            0
        }
    }

    /// Arc length of the whole segment, or zero without geometry.
    pub fn length(&self) -> Distance {
        self.spline
            .as_ref()
            .map(|s| s.total_length())
            .unwrap_or(Distance::ZERO)
    }

    /// The point at some fraction of the way along, clamped to [0, 1]. Without geometry, this is
    /// the origin.
    pub fn interpolate(&self, progress: f64) -> Pt3D {
        let spline = match self.spline {
            Some(ref s) => s,
            None => return Pt3D::origin(),
        };
        let dist = progress.clamp(0.0, 1.0) * spline.total_length().inner_meters();
        match spline.locate(dist) {
            Some((idx, u)) => spline.interpolate(u, idx),
            None => Pt3D::origin(),
        }
    }

    /// Which way traffic faces at some distance along the segment. Only the waypoints
    /// bracketing that distance matter, not the tangent of the curve; height is ignored. Zero
    /// without geometry.
    pub fn heading(&self, traveled: Distance) -> Angle {
        let spline = match self.spline {
            Some(ref s) => s,
            None => return Angle::ZERO,
        };
        let lengths = spline.segment_lengths();
        if lengths.is_empty() {
            return Angle::ZERO;
        }

        let mut idx = lengths.len() - 1;
        let mut sum = Distance::ZERO;
        for (i, len) in lengths.into_iter().enumerate() {
            sum += len;
            if sum > traveled {
                idx = i;
                break;
            }
        }

        let pts = spline.control_points();
        let dir = pts[idx + 1].flatten_y() - pts[idx].flatten_y();
        Angle::heading_of(dir.x(), dir.z())
    }

    /// Approximately the closest any point in `[min, max]` along the segment comes to `pos`.
    /// Bounds are swapped if needed and clamped to the segment, then sampled every meter. None
    /// without geometry.
    pub fn distance(&self, pos: Pt3D, min: Distance, max: Distance) -> Option<Distance> {
        let spline = self.spline.as_ref()?;
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        let len = spline.total_length();
        let low = min.clamp_to(Distance::ZERO, len).inner_meters();
        let high = max.clamp_to(Distance::ZERO, len).inner_meters();

        let mut closest: Option<Distance> = None;
        let mut d = low;
        while d <= high {
            if let Some(pt) = spline.dist_along(Distance::meters(d)) {
                let dist = pt.dist_to(pos);
                if closest.map(|c| dist < c).unwrap_or(true) {
                    closest = Some(dist);
                }
            }
            d += 1.0;
        }
        closest
    }

    /// Can `requester` safely enter this segment at `traveled`? Nobody else may be inside the
    /// occupancy window around that point. A manually driven steering car isn't tracked along
    /// segments, so instead it mustn't be physically close to the window. Never clear without
    /// geometry, since nobody can drive there yet.
    pub fn is_clear(
        &self,
        requester: AgentID,
        traveled: Distance,
        traffic: &dyn TrafficView,
        cfg: &OccupancyConfig,
    ) -> bool {
        if !self.initialized || self.spline.is_none() {
            return false;
        }

        let low = traveled - cfg.behind;
        let high = traveled + cfg.ahead;
        let in_window = |d: Distance| low < d && d < high;

        for agent in traffic.agents() {
            if agent.id != requester
                && agent.current_segment == Some(self.id)
                && in_window(agent.traveled_distance)
            {
                return false;
            }
        }

        if let Some(car) = traffic.steering_car() {
            if car.id != requester {
                if car.autopilot {
                    if car.current_segment == Some(self.id) && in_window(car.traveled_distance) {
                        return false;
                    }
                } else if let Some(dist) = self.distance(car.position, low, high) {
                    if dist < cfg.manual_clearance {
                        return false;
                    }
                }
            }
        }

        true
    }

    /// Remembers where an agent enters this segment, if not at the start.
    pub fn set_traveled_distance(&mut self, agent: AgentID, dist: Distance) {
        self.traveled_distance_overrides.insert(agent, dist);
    }

    /// Where the agent enters this segment. This consumes any value from
    /// `set_traveled_distance`, so asking again returns zero.
    pub fn take_traveled_distance(&mut self, agent: AgentID) -> Distance {
        self.traveled_distance_overrides
            .remove(&agent)
            .unwrap_or(Distance::ZERO)
    }

    /// Arc length from the start up to the last occurrence of a via waypoint. Zero if the
    /// waypoint isn't one of ours.
    pub fn via_wp_position(&self, wp: WaypointID) -> Distance {
        let spline = match self.spline {
            Some(ref s) => s,
            None => return Distance::ZERO,
        };
        match self.via.iter().rposition(|w| *w == wp) {
            Some(idx) => spline.segment_lengths().into_iter().take(idx + 1).sum(),
            None => Distance::ZERO,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.name)
    }
}
