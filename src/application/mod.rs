//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod marshal;
pub mod options;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use marshal::{marshal, Document, IntoDocument};
pub use options::{OutputFormat, OutputMode, PackOptions};
pub use services::PackService;
