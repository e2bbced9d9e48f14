pub mod storage;
pub mod tranzila;
pub mod twilio;

pub use storage::*;
pub use tranzila::*;
pub use twilio::*;
