//! Markers for inspecting a road network during development: a small box at every waypoint and a
//! polyline along every segment. Nothing here affects how traffic uses the network.

use std::collections::BTreeMap;

use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::{Deserialize, Serialize};

use geom::{Distance, Pt3D};

use crate::{Segment, Waypoint};

const BOX_HALF_EXTENT: Distance = Distance::const_meters(0.3);
const BOX_COLOR: &str = "#FF0000";
const CURVE_COLOR: &str = "#0000FF";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebugBox {
    pub name: String,
    pub center: Pt3D,
    pub half_extent: Distance,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebugCurve {
    pub name: String,
    pub pts: Vec<Pt3D>,
    pub color: String,
}

/// Markers are keyed by name, so redrawing an object replaces its old marker.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DebugDrawing {
    boxes: BTreeMap<String, DebugBox>,
    curves: BTreeMap<String, DebugCurve>,
}

impl DebugDrawing {
    pub fn new() -> DebugDrawing {
        DebugDrawing::default()
    }

    pub fn add_waypoint(&mut self, wp: &Waypoint) {
        let name = format!("box_{}", wp.name);
        self.boxes.insert(
            name.clone(),
            DebugBox {
                name,
                center: wp.pos(),
                half_extent: BOX_HALF_EXTENT,
                color: BOX_COLOR.to_string(),
            },
        );
    }

    /// Segments without geometry have nothing to draw, so any old curve is dropped.
    pub fn add_segment(&mut self, s: &Segment) {
        let name = format!("segment_{}", s.name);
        match s.spline() {
            Some(spline) => {
                self.curves.insert(
                    name.clone(),
                    DebugCurve {
                        name,
                        pts: spline.sample(s.num_curve_subdivisions()),
                        color: CURVE_COLOR.to_string(),
                    },
                );
            }
            None => {
                self.curves.remove(&name);
            }
        }
    }

    pub fn boxes(&self) -> impl Iterator<Item = &DebugBox> {
        self.boxes.values()
    }

    pub fn curves(&self) -> impl Iterator<Item = &DebugCurve> {
        self.curves.values()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty() && self.curves.is_empty()
    }

    /// Flattens everything onto the ground plane, using X and Z as the 2D coordinates. Boxes
    /// become squares.
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features = Vec::new();
        for b in self.boxes.values() {
            let r = b.half_extent.inner_meters();
            let (x, z) = (b.center.x(), b.center.z());
            let ring = vec![
                vec![x - r, z - r],
                vec![x + r, z - r],
                vec![x + r, z + r],
                vec![x - r, z + r],
                vec![x - r, z - r],
            ];
            features.push(make_feature(
                Value::Polygon(vec![ring]),
                &b.name,
                "waypoint",
                &b.color,
            ));
        }
        for c in self.curves.values() {
            let line = c.pts.iter().map(|pt| vec![pt.x(), pt.z()]).collect();
            features.push(make_feature(
                Value::LineString(line),
                &c.name,
                "segment",
                &c.color,
            ));
        }
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

fn make_feature(value: Value, name: &str, kind: &str, color: &str) -> Feature {
    let mut feature = Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: None,
        foreign_members: None,
    };
    feature.set_property("name", name);
    feature.set_property("kind", kind);
    feature.set_property("color", color);
    feature
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{RawRoadNetwork, RawSegment, RawWaypoint};
    use crate::{NetworkConfig, RoadNetwork};

    #[test]
    fn draws_waypoints_and_driven_segments() {
        let mut raw = RawRoadNetwork::blank();
        raw.waypoints
            .push(RawWaypoint::new("a", Pt3D::new(0.0, 0.0, 0.0)));
        raw.waypoints
            .push(RawWaypoint::new("b", Pt3D::new(10.0, 0.0, 0.0)));
        raw.waypoints
            .push(RawWaypoint::new("c", Pt3D::new(20.0, 0.0, -5.0)));
        raw.segments
            .push(RawSegment::new("ab", "a", "c").via(vec!["b"]));
        let mut teleport = RawSegment::new("ca", "c", "a");
        teleport.jump = true;
        raw.segments.push(teleport);

        let map = RoadNetwork::new(raw, NetworkConfig::with_debug_drawing());
        let debug = map.debug_drawing().unwrap();
        assert_eq!(debug.boxes().count(), 3);
        let curves: Vec<&DebugCurve> = debug.curves().collect();
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].name, "segment_ab");
        // 10 samples per sub-segment, plus the end
        assert_eq!(curves[0].pts.len(), 21);

        let fc = debug.to_geojson();
        assert_eq!(fc.features.len(), 4);
        let segment = fc
            .features
            .iter()
            .find(|f| f.property("kind").and_then(|k| k.as_str()) == Some("segment"))
            .unwrap();
        assert_eq!(
            segment.property("name").and_then(|n| n.as_str()),
            Some("segment_ab")
        );
        match segment.geometry.as_ref().unwrap().value {
            Value::LineString(ref pts) => {
                assert_eq!(pts[0], vec![0.0, 0.0]);
                assert_eq!(pts.len(), 21);
            }
            ref x => panic!("unexpected geometry {:?}", x),
        }
    }

    #[test]
    fn off_by_default() {
        let mut raw = RawRoadNetwork::blank();
        raw.waypoints
            .push(RawWaypoint::new("a", Pt3D::new(0.0, 0.0, 0.0)));
        let map = RoadNetwork::new(raw, NetworkConfig::default());
        assert!(map.debug_drawing().is_none());
    }
}
