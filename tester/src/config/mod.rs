//! Configuration Management
//!
//! Runner configuration and its builder.

pub mod builder;
pub mod runner;

// Re-export main types
pub use builder::RunnerConfigBuilder;
pub use runner::{parse_setting, parse_setting_value, RunnerConfig, TestTarget};
