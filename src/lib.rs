//! pbxgen core library.
//!
//! Converts a resolved build graph into an Xcode project bundle. A graph is
//! usually loaded from a [`description`] file, checked into a
//! [`graph::BuildGraph`], and handed to [`pbxproj`] together with a
//! [`toolchain::Toolchain`] describing the build environment. The [`cli`] and
//! [`runner`] modules back the `pbxgen` binary.

pub mod cli;
pub mod description;
pub mod graph;
pub mod pbxproj;
pub mod runner;
pub mod toolchain;
