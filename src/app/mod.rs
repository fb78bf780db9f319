//! Application module
//!
//! Process-level concerns of the gateway binary: verbosity, logging setup,
//! fatal error reporting and the shutdown signal listener.

pub mod config;
pub mod error_handling;
pub mod logging;
pub mod runtime;

pub use config::AppConfig;
pub use error_handling::handle_fatal_error;
pub use logging::init_logging;
pub use runtime::spawn_shutdown_listener;
