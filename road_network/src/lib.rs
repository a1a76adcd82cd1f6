//! A directed graph of named waypoints, joined by straight or curved segments, for autonomous
//! traffic to follow.
//!
//! Building happens in two phases. Some loader produces a `RawRoadNetwork` of plain records that
//! refer to each other by name; `RoadNetwork::new` then resolves those names into IDs and builds a
//! spline for every segment. After that, traffic agents ask the network every tick where they are
//! (`Segment::interpolate`), which way they're facing (`Segment::heading`), where to go next
//! (`Waypoint::next_segment`), and whether it's safe to enter a segment (`Segment::is_clear`).
//!
//! Nothing here is thread-safe; the host simulation calls in from a single thread.

#[macro_use]
extern crate log;

mod config;
mod debug;
mod network;
mod objects;
pub mod raw;
mod traffic;

pub use crate::config::{DrivingSide, NetworkConfig, OccupancyConfig};
pub use crate::debug::{DebugBox, DebugCurve, DebugDrawing};
pub use crate::network::RoadNetwork;
pub use crate::objects::segment::{Segment, SegmentID};
pub use crate::objects::waypoint::{Waypoint, WaypointID};
pub use crate::traffic::{AgentID, AgentState, SteeringCarState, TrafficSnapshot, TrafficView};

use geom::Distance;

/// When an agent switches onto a neighboring segment, it aims this far ahead on the neighbor.
pub const LANE_CHANGE_LOOKAHEAD: Distance = Distance::const_meters(30.0);
