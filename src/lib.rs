pub mod app;

pub use app::{App, AppOptions, ShutdownManager};
