//! Executable resolution and asynchronous launch: the persistent path
//! cache, the bounded filesystem search, and the worker-pool supervisor.

mod cache;
mod resolver;
mod supervisor;

pub use cache::ExecCache;
pub use resolver::{ExecutableResolver, Resolve};
pub use supervisor::{LaunchOutcome, LaunchSupervisor};
