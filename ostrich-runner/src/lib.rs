pub mod capability;
mod collector;
pub mod executor;
pub mod process;

pub use capability::timeout_supported;
pub use executor::{run, run_blocking, ProcessRunner};
pub use process::{ProcessSpec, RunnerConfig};
