//! Runtime Management
//!
//! Work directory handling, workload execution, the per-target run loop and
//! the suite that drives it over every target.

pub mod component_run;
pub mod suite;
pub mod work_dir;
pub mod workload;

// Re-export main types
pub use component_run::{ComponentRun, RunReport, CLUSTER_URL_ENV, COMPANION_URL_ENV, COMPONENT_ENV, TEST_CONFIG_ENV};
pub use suite::{SuiteReport, SuiteRun};
pub use work_dir::WorkDir;
pub use workload::{WorkloadOutcome, WorkloadRunner};
