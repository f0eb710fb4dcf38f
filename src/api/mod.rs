pub mod client;
pub mod elections;
pub mod models;
pub mod voters;
pub mod voting;

pub use client::NtrovoteClient;
pub use models::*;
pub use voting::BallotApi;
