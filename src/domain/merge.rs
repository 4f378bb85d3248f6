//! Merge policy and the merge algorithm, written once for every representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::fragment::{Entries, Fragment};

/// How two contributions to the same key combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// The later contribution replaces the earlier one.
    #[default]
    Shallow,
    /// Mappings are unioned recursively; everything else is replaced.
    Deep,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::Shallow => f.write_str("shallow"),
            MergePolicy::Deep => f.write_str("deep"),
        }
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shallow" => Ok(MergePolicy::Shallow),
            "deep" => Ok(MergePolicy::Deep),
            other => Err(format!(
                "invalid merge strategy '{other}' (expected shallow or deep)"
            )),
        }
    }
}

/// Merge `overlay` onto `base`.
///
/// Sequences are never merged element-wise, they are replaced like any other
/// non-mapping value.
pub fn merge<F: Fragment>(base: F, overlay: F, policy: MergePolicy) -> F {
    if policy == MergePolicy::Shallow || !base.is_mapping() || !overlay.is_mapping() {
        return overlay;
    }
    let (mut base, mut overlay) = (base, overlay);
    let mut foot = base.take_foot();
    foot.append(&mut overlay.take_foot());

    let mut merged = match (base.into_entries(), overlay.into_entries()) {
        (Ok(mut base_entries), Ok(overlay_entries)) => {
            merge_entries(&mut base_entries, overlay_entries, policy);
            F::from_entries(base_entries)
        }
        (_, Ok(overlay_entries)) => F::from_entries(overlay_entries),
        (_, Err(overlay)) => overlay,
    };
    merged.append_foot(foot);
    merged
}

/// Merge entries into an accumulator in place.
///
/// New keys are appended, so the accumulator keeps first-contribution order.
/// A replaced value takes the overlay's key along with it; a recursively merged
/// mapping keeps the accumulator's key.
pub fn merge_entries<F: Fragment>(
    accumulator: &mut Entries<F>,
    overlay: Entries<F>,
    policy: MergePolicy,
) {
    for (id, (key, value)) in overlay {
        match accumulator.get_mut(&id) {
            Some(slot)
                if policy == MergePolicy::Deep && slot.1.is_mapping() && value.is_mapping() =>
            {
                let previous = std::mem::replace(&mut slot.1, F::from_entries(Entries::<F>::new()));
                slot.1 = merge(previous, value, policy);
            }
            Some(slot) => *slot = (key, value),
            None => {
                accumulator.insert(id, (key, value));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::Node;
    use crate::domain::scalar::Scalar;
    use crate::domain::value::Value;
    use std::collections::BTreeMap;

    fn map(pairs: &[(&str, Value)]) -> Value {
        Value::Mapping(
            pairs
                .iter()
                .map(|(k, v)| (Scalar::from(*k), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn int(i: i64) -> Value {
        Value::Scalar(Scalar::Int(i))
    }

    fn first() -> Value {
        map(&[("a", int(1)), ("nested", map(&[("x", int(1))]))])
    }

    fn second() -> Value {
        map(&[("b", int(2)), ("nested", map(&[("y", int(2))]))])
    }

    #[test]
    fn given_shallow_policy_when_merging_maps_then_overlay_replaces() {
        let merged = merge(first(), second(), MergePolicy::Shallow);
        assert_eq!(merged, second());
    }

    #[test]
    fn given_deep_policy_when_merging_maps_then_unions_recursively() {
        let merged = merge(first(), second(), MergePolicy::Deep);
        assert_eq!(
            merged,
            map(&[
                ("a", int(1)),
                ("b", int(2)),
                ("nested", map(&[("x", int(1)), ("y", int(2))])),
            ])
        );
    }

    #[test]
    fn given_deep_policy_when_merging_sequences_then_replaces_wholesale() {
        let base = map(&[("list", Value::Sequence(vec![int(1), int(2)]))]);
        let overlay = map(&[("list", Value::Sequence(vec![int(3)]))]);
        let merged = merge(base, overlay.clone(), MergePolicy::Deep);
        assert_eq!(merged, overlay);
    }

    #[test]
    fn given_deep_policy_when_map_meets_scalar_then_scalar_wins() {
        let base = map(&[("k", map(&[("x", int(1))]))]);
        let overlay = map(&[("k", int(5))]);
        assert_eq!(merge(base, overlay.clone(), MergePolicy::Deep), overlay);
    }

    #[test]
    fn given_nodes_when_deep_merging_then_keeps_first_contribution_order() {
        let base = Node::from_value(map(&[("z", int(1)), ("a", int(1))]));
        let overlay = Node::from_value(map(&[("m", int(2)), ("z", int(2))]));

        let merged = merge(base, overlay, MergePolicy::Deep);

        let keys: Vec<String> = merged
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.to_string())
            .collect();
        // Node::from_value iterates the sorted BTreeMap, so base order is a, z
        assert_eq!(keys, vec!["a", "z", "m"]);
        assert_eq!(merged.get("z").unwrap().scalar_text(), Some("2"));
    }

    #[test]
    fn given_nodes_with_foot_comments_when_deep_merging_then_both_feet_kept() {
        let mut base = Node::from_value(map(&[("a", int(1))]));
        base.comments.foot = vec!["# base".to_string()];
        let mut overlay = Node::from_value(map(&[("b", int(2))]));
        overlay.comments.foot = vec!["# overlay".to_string()];

        let merged = merge(base, overlay, MergePolicy::Deep);

        assert_eq!(merged.comments.foot, vec!["# base", "# overlay"]);
    }

    #[test]
    fn given_policy_names_when_parsing_then_accepts_known_values() {
        assert_eq!("deep".parse::<MergePolicy>(), Ok(MergePolicy::Deep));
        assert!("union".parse::<MergePolicy>().is_err());
    }
}
