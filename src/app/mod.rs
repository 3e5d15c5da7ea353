//! Application Layer
//!
//! User-facing CLI, configuration management and the terminal views.

pub mod cli;
pub mod config;
pub mod console;

pub use cli::Cli;
pub use config::Config;
pub use console::ConsoleView;
