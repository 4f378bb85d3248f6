//! Application services

pub mod builder;
pub(crate) mod comments;
pub mod include;
pub mod pack;
pub mod parser;

pub use builder::{processing_order, Contribution, PackBuilder};
pub use include::{IncludeResolver, INCLUDE_TAG, INCLUDE_TEXT_TAG};
pub use pack::PackService;
pub use parser::{parse_source, FragmentParser, SourceFormat};
