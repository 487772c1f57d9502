pub mod builtin;
#[allow(clippy::module_inception)]
pub mod executor;
pub mod job_manager;
pub mod plan;

pub use builtin::Flow;
pub use executor::Executor;
pub use job_manager::JobManager;
