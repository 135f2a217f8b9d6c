//! Command handlers for the Docroute CLI.

pub mod build;
pub mod eval;
pub mod query;
pub mod status;

pub use build::BuildCommand;
pub use eval::EvalCommand;
pub use query::QueryCommand;
pub use status::StatusCommand;
