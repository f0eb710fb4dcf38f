pub mod app;
pub mod pages;
pub mod widgets;

pub use app::TuiApp;
