//! DevStack instance resolution and HTTP client construction
//!
//! The one pattern every external-service module shares: a read-only
//! registry of named instances, a factory that lazily builds and caches a
//! configured HTTP client per instance, and a classifier that turns
//! transport failures into stable error kinds.
//!
//! TLS relaxation (`trust-all-certificates`) is always scoped to the single
//! client being built. Nothing in this crate touches process-wide TLS state.

mod error;
mod factory;
mod registry;

pub use error::{classify_transport, ConnectError, TransportKind};
pub use factory::{ClientFactory, ClientHandle};
pub use registry::{Credential, InstanceConfig, InstanceRegistry};
