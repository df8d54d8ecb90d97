//! EVSE aggregate

pub mod model;

pub use model::{Evse, PlugType, SocketOutlet};
