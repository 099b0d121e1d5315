pub mod config;
pub mod context;
pub mod exec;
pub mod grammar;
pub mod netconf;
pub mod render;
pub mod resolve;
pub mod style;

// Convenience re-exports (optional, but nice)
pub use config::{Config, ConfigTree};
pub use grammar::{Action, Grammar};
pub use render::{render, Rendered};
pub use resolve::{resolve, CommandTemplate, ConnectArgs, ResolvedInvocation};
