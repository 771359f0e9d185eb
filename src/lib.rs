//! Self-healing path registry shared by the ProjectSuite executables.
//!
//! Each tool constructs one [`Registry`] at startup (usually through
//! [`Registry::bootstrap`]) and passes it to everything that needs a
//! location. Lookups chase relocated targets and create missing
//! directories before giving up; diagnostics and auto-repair cover the
//! rest. Overrides layer as: computed defaults, then persisted config,
//! then legacy flat files, then environment variables, then explicit
//! registration.

pub mod clock;
pub mod config;
pub mod defaults;
pub mod diagnose;
pub mod entry;
pub mod env;
pub mod heal;
pub mod locate;
pub mod migrate;
pub mod registry;
pub mod repair;
pub mod report;
pub mod snapshot;

pub use defaults::Defaults;
pub use entry::{Origin, PathEntry, PathKind};
pub use registry::Registry;
