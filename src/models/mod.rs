pub mod common;
pub mod location;
pub mod order;
pub mod payment;
pub mod product;
pub mod staff;
pub mod vendor;

pub use common::*;
pub use location::*;
pub use order::*;
pub use payment::*;
pub use product::*;
pub use staff::*;
pub use vendor::*;
