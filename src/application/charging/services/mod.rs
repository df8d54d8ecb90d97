pub mod reservation_expiry;

pub use reservation_expiry::start_reservation_expiry_task;
