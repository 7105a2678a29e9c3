//! Intersection results are stored as JSON blobs under keys derived from the city and the street
//! names, and produced by workers claiming rows from a status-tracked queue. This crate holds the
//! key naming, the blob stores, and the queue bookkeeping.

#[macro_use]
extern crate log;

pub use self::keys::{city_key, intersection_key, parse_intersection_key, CityName};
pub use self::queue::{Row, Status, WorkQueue};
pub use self::store::{read_json, write_json, BlobStore, FileStore, MemoryStore};

mod keys;
mod queue;
mod store;
