//! Core of the Ollama tray: command execution, status probing, service control
//! and the event loop tying them together. The tray front end lives in the binary.

pub mod config;
pub mod control;
pub mod exec;
pub mod icon;
pub mod probe;
pub mod reactor;
pub mod signals;
pub mod state;

pub use config::TrayConfig;
pub use exec::{CommandResult, CommandRunner, ExecError, SystemRunner};
pub use reactor::{Flow, Reactor, StatusSink, TrayEvent};
pub use state::ServiceState;
