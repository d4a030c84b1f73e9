pub mod app;
pub mod backend;
pub mod cli;
pub mod constants;
pub mod runtime;
pub mod session;
pub mod tui;
pub mod utils;

pub use app::{load_config, Config};
pub use backend::{BackendError, BackendGateway, HttpGateway, ServiceTag, SimulatedGateway};
pub use session::{ConnectivityStatus, Message, SessionController, SessionState};
pub use tui::run_ui;
pub use utils::FinovaError;
