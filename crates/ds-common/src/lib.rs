//! DevStack shared utilities
//!
//! Small pieces used by every crate in the workspace. Currently this is
//! limited to the logging bootstrap; domain types live in their own crates.

pub mod logging;
