//! A grab-bag of utility functions shared by the intersection crates: an OSM tag map, small
//! collections, JSON helpers, and logging setup.

#[macro_use]
extern crate log;

mod collections;
mod io;
pub mod logger;
mod tags;

pub use crate::collections::{Counter, MultiMap};
pub use crate::io::{
    deserialize_btreemap, from_json, serialize_btreemap, to_json, to_json_terse,
};
pub use crate::tags::Tags;

// Thanks https://stackoverflow.com/a/49806368
#[macro_export]
macro_rules! skip_fail {
    ($res:expr) => {
        match $res {
            Some(val) => val,
            None => {
                continue;
            }
        }
    };
}

/// Logs how long something took, at debug level.
pub fn time_it<T, F: FnOnce() -> T>(name: &str, f: F) -> T {
    let start = std::time::Instant::now();
    let result = f();
    debug!("{} took {:.3}s", name, start.elapsed().as_secs_f64());
    result
}
