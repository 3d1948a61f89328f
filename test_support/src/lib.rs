//! Shared fixtures for pbxgen's tests.
//!
//! [`graphs`] builds sample build graphs and the toolchain they are generated
//! against; [`scan`] reads generated project text back into identifiers,
//! sections and records so tests can check the object graph without a full
//! parser. [`logs`] captures what the generator logs while it runs.

pub mod graphs;
pub mod logs;
pub mod scan;

pub use graphs::{multi_target_graph, single_app_graph, toolchain, toolchain_in};
pub use logs::capture_logs;
pub use scan::ProjectScan;
