pub mod segment;
pub mod waypoint;
