pub mod panels;
pub mod poll_manager;

pub use panels::{otp_panel, results_panel, stats_panel, AdminPanels};
pub use poll_manager::{PanelSnapshot, PollManager, POLL_PERIOD};
