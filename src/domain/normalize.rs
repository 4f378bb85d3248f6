//! Scalar normalizer: YAML 1.1 boolean spellings to YAML 1.2 booleans.

use crate::domain::node::{Node, NodeKind, ScalarStyle};
use crate::domain::scalar::legacy_boolean;

/// Rewrite unquoted `y/yes/on` and `n/no/off` scalars (any case) to `true`
/// and `false`, recursively through mappings and sequences.
///
/// Keys, quoted and block scalars, and tagged scalars are left alone. Running
/// it twice gives the same tree as running it once.
pub fn normalize_booleans(node: &mut Node) {
    match &mut node.kind {
        NodeKind::Scalar { text, style } => {
            if *style != ScalarStyle::Plain || node.tag.is_some() {
                return;
            }
            if let Some(b) = legacy_boolean(text) {
                *text = b.to_string();
            }
        }
        NodeKind::Sequence(items) => items.iter_mut().for_each(normalize_booleans),
        NodeKind::Mapping(entries) => entries
            .values_mut()
            .for_each(|entry| normalize_booleans(&mut entry.value)),
    }
}
