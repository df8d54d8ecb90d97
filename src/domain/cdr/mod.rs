//! Charge detail records

pub mod model;

pub use model::ChargeDetailRecord;
