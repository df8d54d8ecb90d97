//! Authentication
//!
//! Credentials a driver presents and the authentication modes a charging
//! station offers.

pub mod model;

pub use model::{AuthIdentification, AuthToken, AuthenticationMode, AuthenticationModes, PinCode};
