pub mod blind_zone;
pub mod conflict;
pub mod guideway;
pub mod lane;
pub mod meta;
pub mod path;
