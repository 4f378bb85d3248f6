//! Domain layer: value models and the merge algorithm
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod fragment;
pub mod keys;
pub mod merge;
pub mod node;
pub mod normalize;
pub mod pack;
pub mod scalar;
pub mod value;

pub use error::{DomainError, IncludeFailure};
pub use fragment::{Entries, Fragment};
pub use keys::normalize_keys;
pub use merge::{merge, merge_entries, MergePolicy};
pub use node::{Comments, Entry, Node, NodeKind, ScalarStyle};
pub use normalize::normalize_booleans;
pub use pack::{PackChild, PackEntry, PackNode};
pub use scalar::Scalar;
pub use value::Value;
