//! Roaming network: root of the containment hierarchy

pub mod model;

pub use model::{RoamingNetwork, RoamingNetworkId};
