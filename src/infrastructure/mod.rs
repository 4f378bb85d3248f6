//! Infrastructure layer: I/O implementations, encoding and DI container
//!
//! This layer implements I/O boundary traits and wires up services.

pub mod di;
pub mod encoder;
pub mod error;
pub mod output;
pub mod traits;

pub use encoder::{encode, YamlEmitter};
pub use error::{InfraError, InfraResult};
pub use output::write_atomic;
