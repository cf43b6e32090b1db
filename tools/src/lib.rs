//! PROGOUR tools — catalog, shell runner and installation probe
//!
//! The HTTP front end resolves tool ids through the [`Registry`], runs the
//! resulting command lines through a [`CommandRunner`] and reports
//! installation status through an [`InstallProbe`].

use std::time::Duration;

pub mod catalog;
pub mod install;
pub mod probe;
pub mod registry;
pub mod runner;

pub use install::InstallPlanner;
pub use probe::{InstallProbe, WhichProbe};
pub use registry::{Category, CategoryStatus, Registry, Tool, ToolStatus};
pub use runner::{CommandRunner, ExecutionResult, ExecutionStatus, ShellRunner};

/// Timeout for tool and ad-hoc commands
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for package installation
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(120);
/// Timeout for a single installation probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
