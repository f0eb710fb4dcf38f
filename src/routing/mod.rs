pub mod guard;
pub mod navigator;
pub mod route;

pub use guard::{guard, GuardDecision};
pub use navigator::{Location, Navigator, View};
pub use route::{Access, Route};
