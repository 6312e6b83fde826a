//! Command-line driver for the trade list view engine.
//!
//! Loads a trade file, opens the view from a query string or the stored
//! state, optionally replays a scripted session, and reports the rendered
//! page with its statistics.

pub mod app;
pub mod config;
pub mod error;
pub mod script;

pub use app::{load_trades, Application, ViewReport};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use script::{load_script, parse_script, Action, Step};
