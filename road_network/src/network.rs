use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Result};
use rand::Rng;
use rand_xorshift::XorShiftRng;

use abstutil::{plain_list_names, prettyprint_usize};
use geom::{Distance, Pt3D};

use crate::raw::{RawRoadNetwork, RawSegment, RawWaypoint};
use crate::{
    AgentID, DebugDrawing, DrivingSide, NetworkConfig, Segment, SegmentID, TrafficView, Waypoint,
    WaypointID,
};

/// Spawning picks uniformly among this many of the closest start waypoints.
const NEARBY_CANDIDATES: usize = 5;

/// Owns every waypoint and segment. Objects refer to each other by ID, which indexes into the
/// vectors here; IDs stay valid for the lifetime of the network, since nothing is ever removed.
#[derive(Clone, Debug)]
pub struct RoadNetwork {
    waypoints: Vec<Waypoint>,
    segments: Vec<Segment>,
    waypoint_names: BTreeMap<String, WaypointID>,
    segment_names: BTreeMap<String, SegmentID>,

    driving_side: DrivingSide,
    config: NetworkConfig,
    debug: Option<DebugDrawing>,
    helper_counter: usize,
}

impl RoadNetwork {
    /// Resolves every name and builds all segment geometry. Bad input is logged and tolerated:
    /// for duplicate names the first definition wins, and segments with dangling references just
    /// stay partly resolved.
    pub fn new(raw: RawRoadNetwork, config: NetworkConfig) -> RoadNetwork {
        let mut map = RoadNetwork {
            waypoints: Vec::new(),
            segments: Vec::new(),
            waypoint_names: BTreeMap::new(),
            segment_names: BTreeMap::new(),

            driving_side: raw.driving_side,
            debug: if config.wants_debug_drawing() {
                Some(DebugDrawing::new())
            } else {
                None
            },
            config,
            helper_counter: 0,
        };

        for s in &raw.segments {
            if map.segment_names.contains_key(&s.id) {
                warn!("Segment {} is defined twice; ignoring the second", s.id);
                continue;
            }
            if let Err(err) = s.check_attributes() {
                warn!("Skipping segment: {}", err);
                continue;
            }
            map.register_segment(s);
        }

        for w in &raw.waypoints {
            if map.waypoint_names.contains_key(&w.id) {
                warn!("Waypoint {} is defined twice; ignoring the second", w.id);
                continue;
            }
            let outgoing = map
                .segments
                .iter()
                .filter(|s| s.from_name == w.id)
                .map(|s| s.id)
                .collect();
            map.register_waypoint(w, outgoing);
        }

        for idx in 0..map.waypoints.len() {
            map.init_waypoint(WaypointID(idx));
        }

        info!(
            "Built road network with {} waypoints and {} segments",
            prettyprint_usize(map.waypoints.len()),
            prettyprint_usize(map.segments.len())
        );
        let mut missing: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (segment, name) in map.unresolved_references() {
            missing.entry(segment).or_default().insert(name);
        }
        for (segment, names) in missing {
            warn!(
                "Segment {} refers to unknown {}",
                segment,
                plain_list_names(names)
            );
        }

        map
    }

    /// Registers a segment, usually so a waypoint added afterwards can use it. If the segment's
    /// start already exists, it becomes one of that waypoint's outgoing segments immediately.
    pub fn add_segment(&mut self, raw: RawSegment) -> Result<SegmentID> {
        if raw.id.is_empty() {
            bail!("Can't add a segment without an id");
        }
        if self.segment_names.contains_key(&raw.id) {
            bail!("Segment {} already exists", raw.id);
        }
        raw.check_attributes()?;
        let id = self.register_segment(&raw);
        if let Some(w) = self.waypoint_names.get(&raw.from).cloned() {
            self.waypoints[w.0].outgoing.push(id);
            self.init_segment(id);
        }

        // Segments that already named this one as a neighbor can resolve it now
        let neighbors_of: Vec<SegmentID> = self
            .segments
            .iter()
            .filter(|s| {
                s.id != id
                    && s.is_initialized()
                    && (s.left_neighbor_name.as_ref() == Some(&raw.id)
                        || s.right_neighbor_name.as_ref() == Some(&raw.id))
            })
            .map(|s| s.id)
            .collect();
        for s in neighbors_of {
            self.init_segment(s);
        }
        Ok(id)
    }

    /// Adds a waypoint while the network is in use. Besides the given `outgoing` segments, every
    /// registered segment that starts at this name becomes outgoing too; all of them are
    /// initialized. Segments that already named this waypoint are rebuilt to include it.
    pub fn add_waypoint(
        &mut self,
        raw: RawWaypoint,
        mut outgoing: Vec<SegmentID>,
    ) -> Result<WaypointID> {
        if raw.id.is_empty() {
            bail!("Can't add a waypoint without an id");
        }
        if self.waypoint_names.contains_key(&raw.id) {
            bail!("Waypoint {} already exists", raw.id);
        }
        for s in &outgoing {
            if self.maybe_get_s(*s).is_none() {
                bail!("Waypoint {} can't start at unknown {}", raw.id, s);
            }
        }
        for s in &self.segments {
            if s.from_name == raw.id && !outgoing.contains(&s.id) {
                outgoing.push(s.id);
            }
        }
        let id = self.register_waypoint(&raw, outgoing);
        self.init_waypoint(id);

        let waiting: Vec<SegmentID> = self
            .segments
            .iter()
            .filter(|s| {
                s.is_initialized()
                    && s.from_name != raw.id
                    && (s.to_name == raw.id || s.via_names.contains(&raw.id))
            })
            .map(|s| s.id)
            .collect();
        for s in waiting {
            self.init_segment(s);
        }
        Ok(id)
    }

    /// Moves a waypoint, rebuilding the geometry of every segment that uses it.
    pub fn set_waypoint_position(&mut self, id: WaypointID, pos: Pt3D) {
        self.waypoints[id.0].position = pos;
        let affected: Vec<SegmentID> = self
            .segments
            .iter()
            .filter(|s| {
                s.is_initialized()
                    && (s.from == Some(id) || s.to == Some(id) || s.via.contains(&id))
            })
            .map(|s| s.id)
            .collect();
        for s in affected {
            self.init_segment(s);
        }
        if self.config.draw_waypoints {
            if let Some(ref mut debug) = self.debug {
                debug.add_waypoint(&self.waypoints[id.0]);
            }
        }
    }

    /// Moves an agent onto a neighboring segment. The agent drives along a new straight helper
    /// segment from `from_pos` to a point `lookahead` further along the neighbor than `progress`,
    /// then continues on the neighbor from there. Returns the helper segment, or None if the
    /// neighbor is too short for the maneuver.
    pub fn splice_onto_neighbor(
        &mut self,
        agent: AgentID,
        from_pos: Pt3D,
        neighbor: SegmentID,
        progress: f64,
        lookahead: Distance,
    ) -> Option<SegmentID> {
        let neighbor_len = self.get_s(neighbor).length();
        if neighbor_len <= lookahead {
            return None;
        }
        let target_progress = progress + lookahead / neighbor_len;
        if target_progress > 1.0 {
            return None;
        }

        let (start_name, segment_name, target_name) = loop {
            self.helper_counter += 1;
            let n = self.helper_counter;
            let names = (
                format!("agent{}_helper_start_{}", agent.0, n),
                format!("agent{}_helper_segment_{}", agent.0, n),
                format!("agent{}_helper_target_{}", agent.0, n),
            );
            if !self.waypoint_names.contains_key(&names.0)
                && !self.segment_names.contains_key(&names.1)
                && !self.waypoint_names.contains_key(&names.2)
            {
                break names;
            }
        };

        // The target has to exist before the helper segment is initialized
        let target_pos = self.get_s(neighbor).interpolate(target_progress);
        let target = self.register_waypoint(
            &RawWaypoint::new(target_name.clone(), target_pos),
            vec![neighbor],
        );
        self.init_waypoint(target);

        let mut raw = RawSegment::new(segment_name, start_name.clone(), target_name);
        raw.speed_kmh = self.get_s(neighbor).speed.to_km_per_hour();
        raw.probability = 1.0;
        let helper = self.register_segment(&raw);
        let start = self.register_waypoint(&RawWaypoint::new(start_name, from_pos), vec![helper]);
        self.init_waypoint(start);

        self.segments[neighbor.0].set_traveled_distance(agent, neighbor_len * target_progress);
        debug!(
            "{} changes onto {} via {}",
            agent,
            self.get_s(neighbor),
            self.get_s(helper)
        );
        Some(helper)
    }

    fn register_segment(&mut self, raw: &RawSegment) -> SegmentID {
        let id = SegmentID(self.segments.len());
        self.segments.push(Segment::new(id, raw));
        self.segment_names.insert(raw.id.clone(), id);
        id
    }

    fn register_waypoint(&mut self, raw: &RawWaypoint, outgoing: Vec<SegmentID>) -> WaypointID {
        let id = WaypointID(self.waypoints.len());
        self.waypoints.push(Waypoint::new(id, raw, outgoing));
        self.waypoint_names.insert(raw.id.clone(), id);
        id
    }

    fn init_waypoint(&mut self, id: WaypointID) {
        for s in self.waypoints[id.0].outgoing.clone() {
            self.init_segment(s);
        }
        if self.config.draw_waypoints {
            if let Some(ref mut debug) = self.debug {
                debug.add_waypoint(&self.waypoints[id.0]);
            }
        }
    }

    fn init_segment(&mut self, id: SegmentID) {
        self.segments[id.0].init(
            &self.waypoint_names,
            &mut self.waypoints,
            &self.segment_names,
        );
        let s = &self.segments[id.0];
        if self.config.draw_segments && !s.is_jump {
            if let Some(ref mut debug) = self.debug {
                debug.add_segment(s);
            }
        }
    }

    pub fn get_w(&self, id: WaypointID) -> &Waypoint {
        &self.waypoints[id.0]
    }

    pub fn get_s(&self, id: SegmentID) -> &Segment {
        &self.segments[id.0]
    }

    /// Only the per-agent entry distances should be changed this way.
    pub fn get_s_mut(&mut self, id: SegmentID) -> &mut Segment {
        &mut self.segments[id.0]
    }

    pub fn maybe_get_w(&self, id: WaypointID) -> Option<&Waypoint> {
        self.waypoints.get(id.0)
    }

    pub fn maybe_get_s(&self, id: SegmentID) -> Option<&Segment> {
        self.segments.get(id.0)
    }

    pub fn find_waypoint(&self, name: &str) -> Option<WaypointID> {
        self.waypoint_names.get(name).cloned()
    }

    pub fn find_segment(&self, name: &str) -> Option<SegmentID> {
        self.segment_names.get(name).cloned()
    }

    pub fn all_waypoints(&self) -> &Vec<Waypoint> {
        &self.waypoints
    }

    pub fn all_segments(&self) -> &Vec<Segment> {
        &self.segments
    }

    pub fn next_segment(
        &self,
        wp: WaypointID,
        preferred: &[SegmentID],
        rng: &mut XorShiftRng,
    ) -> Option<SegmentID> {
        self.get_w(wp).next_segment(self, preferred, rng)
    }

    pub fn is_segment_clear(
        &self,
        s: SegmentID,
        requester: AgentID,
        traveled: Distance,
        traffic: &dyn TrafficView,
    ) -> bool {
        self.get_s(s)
            .is_clear(requester, traveled, traffic, &self.config.occupancy)
    }

    /// Somewhere for traffic to start near `pos`. Any waypoint with somewhere to go counts. So
    /// does a via waypoint whose (randomly picked) parent segment starts at such a waypoint; the
    /// parent's start is what gets returned. None if nothing qualifies.
    pub fn random_nearby_waypoint(&self, pos: Pt3D, rng: &mut XorShiftRng) -> Option<WaypointID> {
        let mut candidates: BTreeMap<WaypointID, Distance> = BTreeMap::new();
        for wp in &self.waypoints {
            let candidate = if !wp.is_end_point() {
                Some(wp.id)
            } else if wp.is_via_wp() {
                wp.random_parent_segment(rng)
                    .and_then(|s| self.get_s(s).from)
                    .filter(|w| !self.get_w(*w).is_end_point())
            } else {
                None
            };
            if let Some(id) = candidate {
                let dist = wp.pos().dist_to(pos);
                let entry = candidates.entry(id).or_insert(dist);
                if dist < *entry {
                    *entry = dist;
                }
            }
        }

        let mut sorted: Vec<(Distance, WaypointID)> =
            candidates.into_iter().map(|(id, d)| (d, id)).collect();
        sorted.sort();
        sorted.truncate(NEARBY_CANDIDATES);
        if sorted.is_empty() {
            return None;
        }
        Some(sorted[rng.gen_range(0..sorted.len())].1)
    }

    pub fn driving_side(&self) -> DrivingSide {
        self.driving_side
    }

    pub fn is_right_hand_traffic(&self) -> bool {
        self.driving_side == DrivingSide::Right
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn debug_drawing(&self) -> Option<&DebugDrawing> {
        self.debug.as_ref()
    }

    /// Every (segment, name) pair where the segment refers to a waypoint or neighbor that doesn't
    /// exist.
    pub fn unresolved_references(&self) -> Vec<(String, String)> {
        let mut result = Vec::new();
        for s in &self.segments {
            for w in std::iter::once(&s.from_name)
                .chain(s.via_names.iter())
                .chain(std::iter::once(&s.to_name))
            {
                if !self.waypoint_names.contains_key(w) {
                    result.push((s.name.clone(), w.clone()));
                }
            }
            for n in s
                .left_neighbor_name
                .iter()
                .chain(s.right_neighbor_name.iter())
            {
                if !self.segment_names.contains_key(n) {
                    result.push((s.name.clone(), n.clone()));
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::LANE_CHANGE_LOOKAHEAD;

    fn wp(name: &str, x: f64, z: f64) -> RawWaypoint {
        RawWaypoint::new(name, Pt3D::new(x, 0.0, z))
    }

    #[test]
    fn duplicates_keep_the_first_definition() {
        let mut raw = RawRoadNetwork::blank();
        raw.waypoints.push(wp("a", 0.0, 0.0));
        raw.waypoints.push(wp("b", 10.0, 0.0));
        raw.waypoints.push(wp("a", 99.0, 99.0));
        raw.segments.push(RawSegment::new("s", "a", "b"));
        raw.segments.push(RawSegment::new("s", "b", "a"));
        let map = RoadNetwork::new(raw, NetworkConfig::default());

        assert_eq!(map.all_waypoints().len(), 2);
        assert_eq!(map.all_segments().len(), 1);
        let a = map.get_w(map.find_waypoint("a").unwrap());
        assert_eq!(a.pos(), Pt3D::new(0.0, 0.0, 0.0));
        let s = map.get_s(map.find_segment("s").unwrap());
        assert_eq!(s.from(), Some(a.id));
        assert_eq!(a.outgoing_segments(), &vec![s.id]);
        assert!(map.get_w(map.find_waypoint("b").unwrap()).is_end_point());
    }

    #[test]
    fn reports_unresolved_references() {
        let mut raw = RawRoadNetwork::blank();
        raw.waypoints.push(wp("a", 0.0, 0.0));
        let mut s = RawSegment::new("s", "a", "ghost").via(vec!["phantom"]);
        s.left_neighbor = Some("nope".to_string());
        raw.segments.push(s);
        let map = RoadNetwork::new(raw, NetworkConfig::default());
        assert_eq!(
            map.unresolved_references(),
            vec![
                ("s".to_string(), "phantom".to_string()),
                ("s".to_string(), "ghost".to_string()),
                ("s".to_string(), "nope".to_string()),
            ]
        );
    }

    #[test]
    fn add_waypoint_completes_waiting_segments() {
        let mut raw = RawRoadNetwork::blank();
        raw.waypoints.push(wp("a", 0.0, 0.0));
        raw.segments.push(RawSegment::new("s", "a", "late"));
        let mut map = RoadNetwork::new(raw, NetworkConfig::default());
        let s = map.find_segment("s").unwrap();
        assert!(!map.get_s(s).has_geometry());

        let late = map.add_waypoint(wp("late", 0.0, -20.0), Vec::new()).unwrap();
        assert!(map.get_s(s).has_geometry());
        assert_eq!(map.get_s(s).to(), Some(late));
        assert_eq!(map.get_s(s).length(), Distance::meters(20.0));

        assert!(map.add_waypoint(wp("late", 1.0, 1.0), Vec::new()).is_err());
        assert!(map
            .add_waypoint(wp("other", 1.0, 1.0), vec![SegmentID(42)])
            .is_err());
    }

    #[test]
    fn add_segment_attaches_to_existing_start() {
        let mut raw = RawRoadNetwork::blank();
        raw.waypoints.push(wp("a", 0.0, 0.0));
        raw.waypoints.push(wp("b", 5.0, 0.0));
        let mut map = RoadNetwork::new(raw, NetworkConfig::default());
        let a = map.find_waypoint("a").unwrap();
        assert!(map.get_w(a).is_end_point());

        let s = map.add_segment(RawSegment::new("ab", "a", "b")).unwrap();
        assert_eq!(map.get_w(a).outgoing_segments(), &vec![s]);
        assert_eq!(map.get_s(s).length(), Distance::meters(5.0));
        assert!(map.add_segment(RawSegment::new("ab", "b", "a")).is_err());
    }

    #[test]
    fn add_waypoint_picks_up_segments_starting_there() {
        let mut raw = RawRoadNetwork::blank();
        raw.waypoints.push(wp("b", 0.0, -10.0));
        raw.segments.push(RawSegment::new("s", "late", "b"));
        let mut map = RoadNetwork::new(raw, NetworkConfig::default());
        let s = map.find_segment("s").unwrap();
        assert!(!map.get_s(s).is_initialized());

        let late = map.add_waypoint(wp("late", 0.0, 0.0), Vec::new()).unwrap();
        assert_eq!(map.get_w(late).outgoing_segments(), &vec![s]);
        assert!(!map.get_w(late).is_end_point());
        assert!(map.get_s(s).is_initialized());
        assert_eq!(map.get_s(s).from(), Some(late));
        assert_eq!(map.get_s(s).length(), Distance::meters(10.0));

        // Listing it explicitly doesn't attach it twice
        map.add_segment(RawSegment::new("t", "later", "b")).unwrap();
        let t = map.find_segment("t").unwrap();
        let later = map.add_waypoint(wp("later", 5.0, 0.0), vec![t]).unwrap();
        assert_eq!(map.get_w(later).outgoing_segments(), &vec![t]);
    }

    #[test]
    fn add_segment_resolves_waiting_neighbors() {
        let mut raw = RawRoadNetwork::blank();
        raw.waypoints.push(wp("a1", 0.0, 0.0));
        raw.waypoints.push(wp("a2", 100.0, 0.0));
        raw.waypoints.push(wp("b1", 0.0, -4.0));
        raw.waypoints.push(wp("b2", 100.0, -4.0));
        let mut right = RawSegment::new("right", "a1", "a2");
        right.left_neighbor = Some("left".to_string());
        raw.segments.push(right);
        let mut map = RoadNetwork::new(raw, NetworkConfig::default());
        let right = map.find_segment("right").unwrap();
        assert_eq!(map.get_s(right).passing_neighbor(DrivingSide::Right), None);

        let left = map.add_segment(RawSegment::new("left", "b1", "b2")).unwrap();
        assert_eq!(
            map.get_s(right).passing_neighbor(DrivingSide::Right),
            Some(left)
        );
        assert_eq!(map.get_s(right).regular_neighbor(DrivingSide::Left), Some(left));
        assert!(map.unresolved_references().is_empty());
    }

    #[test]
    fn unusable_segment_numbers_are_skipped() {
        let mut raw = RawRoadNetwork::blank();
        raw.waypoints.push(wp("a", 0.0, 0.0));
        raw.waypoints.push(wp("b", 10.0, 0.0));
        let mut bad = RawSegment::new("bad", "a", "b");
        bad.speed_kmh = f64::NAN;
        raw.segments.push(bad);
        let mut nan_tension = RawSegment::new("wobbly", "a", "b").via(vec!["b"]);
        nan_tension.curve_tension = f64::INFINITY;
        raw.segments.push(nan_tension);
        raw.segments.push(RawSegment::new("good", "a", "b"));
        let mut map = RoadNetwork::new(raw, NetworkConfig::default());

        assert_eq!(map.all_segments().len(), 1);
        assert_eq!(map.find_segment("bad"), None);
        let a = map.find_waypoint("a").unwrap();
        assert_eq!(
            map.get_w(a).outgoing_segments(),
            &vec![map.find_segment("good").unwrap()]
        );

        let mut late = RawSegment::new("late", "b", "a");
        late.speed_kmh = f64::INFINITY;
        assert!(map.add_segment(late).is_err());
        assert_eq!(map.find_segment("late"), None);
    }

    #[test]
    fn moving_a_waypoint_rebuilds_segments() {
        let mut raw = RawRoadNetwork::blank();
        raw.waypoints.push(wp("a", 0.0, 0.0));
        raw.waypoints.push(wp("b", 10.0, 0.0));
        raw.waypoints.push(wp("c", 20.0, 0.0));
        raw.segments
            .push(RawSegment::new("ac", "a", "c").via(vec!["b"]));
        let mut map = RoadNetwork::new(raw, NetworkConfig::with_debug_drawing());
        let b = map.find_waypoint("b").unwrap();
        let s = map.find_segment("ac").unwrap();
        let before = map.get_s(s).length();

        map.set_waypoint_position(b, Pt3D::new(10.0, 0.0, -10.0));
        assert!(map.get_s(s).length() > before);
        assert_eq!(map.get_w(b).parent_segments(), &vec![s]);
        let debug = map.debug_drawing().unwrap();
        let marker = debug.boxes().find(|x| x.name == "box_b").unwrap();
        assert_eq!(marker.center, Pt3D::new(10.0, 0.0, -10.0));
    }

    #[test]
    fn nearby_waypoints() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        let empty = RoadNetwork::new(RawRoadNetwork::blank(), NetworkConfig::default());
        assert_eq!(empty.random_nearby_waypoint(Pt3D::origin(), &mut rng), None);

        // A chain of 10 waypoints along X; the last one is an end point
        let mut raw = RawRoadNetwork::blank();
        for i in 0..10 {
            raw.waypoints.push(wp(&format!("w{}", i), 10.0 * i as f64, 0.0));
        }
        for i in 0..9 {
            raw.segments.push(RawSegment::new(
                format!("s{}", i),
                format!("w{}", i),
                format!("w{}", i + 1),
            ));
        }
        let map = RoadNetwork::new(raw, NetworkConfig::default());
        let mut seen = BTreeSet::new();
        for _ in 0..200 {
            let id = map
                .random_nearby_waypoint(Pt3D::new(95.0, 0.0, 0.0), &mut rng)
                .unwrap();
            seen.insert(map.get_w(id).name.clone());
        }
        let expected: BTreeSet<String> = (4..9).map(|i| format!("w{}", i)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn via_waypoints_stand_in_for_their_parent() {
        let mut raw = RawRoadNetwork::blank();
        raw.waypoints.push(wp("start", 0.0, 0.0));
        raw.waypoints.push(wp("mid", 500.0, 0.0));
        raw.waypoints.push(wp("end", 1000.0, 0.0));
        raw.segments
            .push(RawSegment::new("long", "start", "end").via(vec!["mid"]));
        let map = RoadNetwork::new(raw, NetworkConfig::default());
        let mut rng = XorShiftRng::seed_from_u64(42);
        // mid and start both map to start; end has nowhere to go
        for _ in 0..20 {
            assert_eq!(
                map.random_nearby_waypoint(Pt3D::new(500.0, 0.0, 0.0), &mut rng),
                map.find_waypoint("start")
            );
        }
    }

    #[test]
    fn lane_change() {
        let mut raw = RawRoadNetwork::blank();
        raw.waypoints.push(wp("a1", 0.0, 0.0));
        raw.waypoints.push(wp("a2", 100.0, 0.0));
        raw.waypoints.push(wp("b1", 0.0, -4.0));
        raw.waypoints.push(wp("b2", 100.0, -4.0));
        let mut right = RawSegment::new("right", "a1", "a2");
        right.left_neighbor = Some("left".to_string());
        raw.segments.push(right);
        let mut left = RawSegment::new("left", "b1", "b2");
        left.speed_kmh = 80.0;
        raw.segments.push(left);
        let mut map = RoadNetwork::new(raw, NetworkConfig::default());

        let agent = AgentID(3);
        let current = map.find_segment("right").unwrap();
        let neighbor = map
            .get_s(current)
            .passing_neighbor(map.driving_side())
            .unwrap();
        let helper = map
            .splice_onto_neighbor(
                agent,
                Pt3D::new(20.0, 0.0, 0.0),
                neighbor,
                0.2,
                LANE_CHANGE_LOOKAHEAD,
            )
            .unwrap();

        let h = map.get_s(helper);
        assert!(h.has_geometry());
        assert!(h
            .interpolate(0.0)
            .approx_eq(Pt3D::new(20.0, 0.0, 0.0), Distance::meters(0.001)));
        assert!(h
            .interpolate(1.0)
            .approx_eq(Pt3D::new(50.0, 0.0, -4.0), Distance::meters(0.001)));
        assert!((h.speed.to_km_per_hour() - 80.0).abs() < 0.001);
        let target = map.get_w(h.to().unwrap());
        assert_eq!(target.outgoing_segments(), &vec![neighbor]);
        assert_eq!(
            map.get_s_mut(neighbor).take_traveled_distance(agent),
            Distance::meters(50.0)
        );

        // Too close to the end of the neighbor
        assert_eq!(
            map.splice_onto_neighbor(
                agent,
                Pt3D::new(90.0, 0.0, 0.0),
                neighbor,
                0.9,
                LANE_CHANGE_LOOKAHEAD
            ),
            None
        );
    }
}
