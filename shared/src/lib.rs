//! Shared types for the test cluster workspace
//!
//! Contains the data model handed between the cluster lifecycle engine,
//! the result recorders and the driver, plus logging setup used by all of them.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
