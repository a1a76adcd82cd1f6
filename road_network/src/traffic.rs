use std::fmt;

use serde::{Deserialize, Serialize};

use geom::{Distance, Pt3D};

use crate::SegmentID;

/// Identifies one traffic agent (a vehicle or a pedestrian) across ticks. The host simulation
/// assigns these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentID(pub usize);

impl fmt::Display for AgentID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Agent #{}", self.0)
    }
}

/// Where an autonomous agent currently is along the network.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentState {
    pub id: AgentID,
    pub current_segment: Option<SegmentID>,
    /// How far along `current_segment` the agent is.
    pub traveled_distance: Distance,
}

/// The single vehicle steered by a person. With the autopilot on, it follows the network like any
/// other agent; otherwise only its raw position is meaningful.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringCarState {
    pub id: AgentID,
    pub autopilot: bool,
    pub current_segment: Option<SegmentID>,
    pub traveled_distance: Distance,
    pub position: Pt3D,
}

/// What the road network needs to know about traffic to answer occupancy queries. Implemented by
/// the host simulation.
pub trait TrafficView {
    /// Every tracked vehicle and pedestrian, excluding the steering car.
    fn agents(&self) -> Box<dyn Iterator<Item = AgentState> + '_>;

    fn steering_car(&self) -> Option<SteeringCarState>;
}

/// A plain copy of the traffic state at one moment.
#[derive(Clone, Debug, Default)]
pub struct TrafficSnapshot {
    pub agents: Vec<AgentState>,
    pub steering_car: Option<SteeringCarState>,
}

impl TrafficSnapshot {
    pub fn new() -> TrafficSnapshot {
        TrafficSnapshot::default()
    }

    pub fn add_agent(&mut self, id: AgentID, current_segment: SegmentID, traveled: Distance) {
        self.agents.push(AgentState {
            id,
            current_segment: Some(current_segment),
            traveled_distance: traveled,
        });
    }
}

impl TrafficView for TrafficSnapshot {
    fn agents(&self) -> Box<dyn Iterator<Item = AgentState> + '_> {
        Box::new(self.agents.iter().copied())
    }

    fn steering_car(&self) -> Option<SteeringCarState> {
        self.steering_car
    }
}
