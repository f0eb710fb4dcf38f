pub mod in_flight;
pub mod phone;

pub use in_flight::{InFlight, InFlightGuard};
pub use phone::{is_valid_phone, PHONE_ERROR};
