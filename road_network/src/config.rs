use serde::{Deserialize, Serialize};

use geom::Distance;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Draw a box at every waypoint into the debug drawing.
    pub draw_waypoints: bool,
    /// Draw every segment that isn't a jump into the debug drawing.
    pub draw_segments: bool,
    pub occupancy: OccupancyConfig,
}

impl NetworkConfig {
    pub fn with_debug_drawing() -> NetworkConfig {
        NetworkConfig {
            draw_waypoints: true,
            draw_segments: true,
            ..Default::default()
        }
    }

    pub fn wants_debug_drawing(&self) -> bool {
        self.draw_waypoints || self.draw_segments
    }
}

/// Decides when a segment counts as occupied. Relative to the position where a new agent wants
/// to enter, any other agent in the open window (position - behind, position + ahead) blocks it.
/// These are tuning values, not physical limits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OccupancyConfig {
    /// Entering just ahead of somebody risks getting rear-ended.
    pub behind: Distance,
    /// Leave plenty of headroom, since segment speeds can be high.
    pub ahead: Distance,
    /// A manually driven steering car this close to the segment blocks it.
    pub manual_clearance: Distance,
}

impl Default for OccupancyConfig {
    fn default() -> OccupancyConfig {
        OccupancyConfig {
            behind: Distance::const_meters(10.0),
            ahead: Distance::const_meters(60.0),
            manual_clearance: Distance::const_meters(1.5),
        }
    }
}

/// Which side of the road regular traffic keeps to. Agents overtake on the other side.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum DrivingSide {
    #[default]
    Right,
    Left,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: NetworkConfig =
            serde_json::from_str(r#"{ "draw_segments": true, "occupancy": { "ahead": 80.0 } }"#)
                .unwrap();
        assert!(!cfg.draw_waypoints);
        assert!(cfg.draw_segments);
        assert!(cfg.wants_debug_drawing());
        assert_eq!(cfg.occupancy.ahead, Distance::meters(80.0));
        assert_eq!(cfg.occupancy.behind, Distance::meters(10.0));
        assert_eq!(cfg.occupancy.manual_clearance, Distance::meters(1.5));
    }

    #[test]
    fn empty_config_means_no_debug_drawing() {
        let cfg: NetworkConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, NetworkConfig::default());
        assert!(!cfg.wants_debug_drawing());
        assert_eq!(cfg.occupancy, OccupancyConfig::default());
        assert_eq!(DrivingSide::default(), DrivingSide::Right);
    }
}
