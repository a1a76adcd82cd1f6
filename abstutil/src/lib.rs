//! Small utilities shared by the road network crates: logger setup, reading and writing JSON, and
//! formatting helpers for log messages.

#[macro_use]
extern crate log;

mod io;
pub mod logger;
mod utils;

pub use crate::io::{read_json, to_json, write_json};
pub use crate::utils::{plain_list_names, prettyprint_usize};
