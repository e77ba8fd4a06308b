//! Core cluster types: lifecycle state, readiness policy and configuration

pub mod config;
pub mod policy;
pub mod state;

pub use config::{ClusterConfig, ClusterConfigBuilder};
pub use policy::{BodyCheck, ReadinessPolicy};
pub use state::ClusterState;
