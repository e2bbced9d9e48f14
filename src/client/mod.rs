//! Customer-side logic: geolocation gate before ordering and order-status tracking.

pub mod geo_gate;
pub mod tracker;

pub use geo_gate::*;
pub use tracker::*;
