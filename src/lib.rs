// Library surface for the terminal binary and the headless integration tests.
pub mod app;
pub mod app_dirs;
pub mod cancel;
pub mod config;
pub mod counter;
pub mod logging;
pub mod observer;
mod recorder;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod ui;
mod window;

pub use counter::{ActionResult, KickCounter};
pub use observer::SessionObserver;
