// Terminal front end. Everything outside the module goes through these re-exports.

mod app;
mod markdown;
mod render;
mod ui;

pub use app::{App, InputMode};
pub use ui::run_ui;
