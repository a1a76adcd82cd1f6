//! Plain records describing a road network, as produced by a scenario loader. Waypoints and
//! segments refer to each other by name; nothing is resolved or validated against the rest of the
//! network yet.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use geom::Pt3D;

use crate::DrivingSide;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawRoadNetwork {
    #[serde(default)]
    pub driving_side: DrivingSide,
    #[serde(default)]
    pub waypoints: Vec<RawWaypoint>,
    #[serde(default)]
    pub segments: Vec<RawSegment>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawWaypoint {
    pub id: String,
    pub position: Pt3D,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_light: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_light_intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_signal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brake_light_on: Option<bool>,
    /// How long traffic should wait at this waypoint, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_time_ms: Option<u64>,
}

impl RawWaypoint {
    pub fn new<I: Into<String>>(id: I, position: Pt3D) -> RawWaypoint {
        RawWaypoint {
            id: id.into(),
            position,
            traffic_light: None,
            head_light_intensity: None,
            turn_signal: None,
            brake_light_on: None,
            waiting_time_ms: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    pub id: String,
    pub from: String,
    /// Intermediate waypoints the segment curves through, in order.
    #[serde(default)]
    pub via: Vec<String>,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_neighbor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_neighbor: Option<String>,
    #[serde(default = "default_speed_kmh")]
    pub speed_kmh: f64,
    /// Traffic teleports across a jump segment instead of driving along it.
    #[serde(default)]
    pub jump: bool,
    /// An unnormalized weight for choosing this segment among its siblings.
    #[serde(default = "default_probability")]
    pub probability: f64,
    /// Names of segments with priority over this one.
    #[serde(default)]
    pub give_way_to: Vec<String>,
    /// Only matters when there are via waypoints.
    #[serde(default = "default_curve_tension")]
    pub curve_tension: f64,
}

fn default_speed_kmh() -> f64 {
    50.0
}

fn default_probability() -> f64 {
    0.5
}

fn default_curve_tension() -> f64 {
    0.05
}

impl RawSegment {
    pub fn new<I1: Into<String>, I2: Into<String>, I3: Into<String>>(
        id: I1,
        from: I2,
        to: I3,
    ) -> RawSegment {
        RawSegment {
            id: id.into(),
            from: from.into(),
            via: Vec::new(),
            to: to.into(),
            left_neighbor: None,
            right_neighbor: None,
            speed_kmh: default_speed_kmh(),
            jump: false,
            probability: default_probability(),
            give_way_to: Vec::new(),
            curve_tension: default_curve_tension(),
        }
    }

    pub fn via<I: Into<String>>(mut self, via: Vec<I>) -> RawSegment {
        self.via = via.into_iter().map(|x| x.into()).collect();
        self
    }

    pub fn probability(mut self, probability: f64) -> RawSegment {
        self.probability = probability;
        self
    }
}

impl RawRoadNetwork {
    pub fn blank() -> RawRoadNetwork {
        RawRoadNetwork::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<RawRoadNetwork> {
        let path = path.as_ref();
        let raw: RawRoadNetwork = abstutil::read_json(path)
            .with_context(|| format!("loading road network from {}", path.display()))?;
        raw.validate()
            .with_context(|| format!("validating {}", path.display()))?;
        Ok(raw)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        abstutil::write_json(path, self)
    }

    /// Rejects records that can't be part of any graph. Dangling references between records are
    /// fine here; they're tolerated while building the network.
    pub fn validate(&self) -> Result<()> {
        for (idx, wp) in self.waypoints.iter().enumerate() {
            if wp.id.is_empty() {
                bail!("waypoint #{} has no id", idx);
            }
        }
        for (idx, seg) in self.segments.iter().enumerate() {
            if seg.id.is_empty() {
                bail!("segment #{} has no id", idx);
            }
            if seg.from.is_empty() || seg.to.is_empty() {
                bail!("segment {} needs both from and to", seg.id);
            }
            seg.check_attributes()?;
        }
        Ok(())
    }
}

impl RawSegment {
    /// The numbers have to be usable before the segment can be built at all.
    pub fn check_attributes(&self) -> Result<()> {
        for (field, value) in [
            ("speed_kmh", self.speed_kmh),
            ("probability", self.probability),
            ("curve_tension", self.curve_tension),
        ] {
            if !value.is_finite() {
                bail!("segment {} has a bad {}: {}", self.id, field, value);
            }
        }
        if self.probability < 0.0 {
            bail!(
                "segment {} has a negative probability {}",
                self.id,
                self.probability
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_get_loader_defaults() {
        let raw: RawRoadNetwork = serde_json::from_str(
            r#"{
                "waypoints": [
                    { "id": "wp1", "position": { "x": 0.0, "y": 0.0, "z": 0.0 } },
                    { "id": "wp2", "position": { "x": 10.0, "y": 0.0, "z": 0.0 },
                      "traffic_light": "tl_3", "waiting_time_ms": 2500 }
                ],
                "segments": [ { "id": "s1", "from": "wp1", "to": "wp2" } ]
            }"#,
        )
        .unwrap();
        assert_eq!(raw.driving_side, DrivingSide::Right);
        assert_eq!(raw.waypoints[1].traffic_light.as_deref(), Some("tl_3"));
        assert_eq!(raw.waypoints[1].waiting_time_ms, Some(2500));

        let seg = &raw.segments[0];
        assert_eq!(seg, &RawSegment::new("s1", "wp1", "wp2"));
        assert_eq!(seg.speed_kmh, 50.0);
        assert!(!seg.jump);
        assert_eq!(seg.probability, 0.5);
        assert_eq!(seg.curve_tension, 0.05);
        assert!(seg.via.is_empty());
        raw.validate().unwrap();
    }

    #[test]
    fn rejects_unusable_records() {
        let mut raw = RawRoadNetwork::blank();
        raw.segments.push(RawSegment::new("s1", "", "wp2"));
        assert!(raw.validate().is_err());

        let mut raw = RawRoadNetwork::blank();
        raw.waypoints.push(RawWaypoint::new("", Pt3D::origin()));
        assert!(raw.validate().is_err());

        let mut raw = RawRoadNetwork::blank();
        raw.segments
            .push(RawSegment::new("s1", "wp1", "wp2").probability(-1.0));
        assert!(raw.validate().is_err());

        let mut seg = RawSegment::new("s1", "wp1", "wp2");
        seg.speed_kmh = f64::INFINITY;
        let err = seg.check_attributes().unwrap_err();
        assert_eq!(err.to_string(), "segment s1 has a bad speed_kmh: inf");
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");

        let mut raw = RawRoadNetwork::blank();
        raw.driving_side = DrivingSide::Left;
        raw.waypoints
            .push(RawWaypoint::new("wp1", Pt3D::new(1.0, 2.0, 3.0)));
        raw.segments
            .push(RawSegment::new("s1", "wp1", "wp1").via(vec!["wp9"]));
        raw.save(&path).unwrap();

        let loaded = RawRoadNetwork::load(&path).unwrap();
        assert_eq!(loaded.driving_side, DrivingSide::Left);
        assert_eq!(loaded.waypoints, raw.waypoints);
        assert_eq!(loaded.segments, raw.segments);
    }

    #[test]
    fn load_reports_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let mut raw = RawRoadNetwork::blank();
        raw.segments.push(RawSegment::new("", "a", "b"));
        raw.save(&path).unwrap();

        let err = RawRoadNetwork::load(&path).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("bad.json"), "{}", msg);
        assert!(msg.contains("segment #0 has no id"), "{}", msg);
    }
}
