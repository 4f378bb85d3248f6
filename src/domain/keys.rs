//! Key normalizer for the JSON boundary.

use crate::domain::scalar::Scalar;
use crate::domain::value::Value;

/// Turn every non-string mapping key into its string form, recursively.
///
/// Only the JSON encoder needs this; YAML output keeps native key types.
/// If a converted key collides with an existing string key (`1` and `"1"`),
/// the entry that sorts last wins.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(key, value)| {
                    let key = match key {
                        Scalar::String(_) => key,
                        other => Scalar::String(other.to_plain_text()),
                    };
                    (key, normalize_keys(value))
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(normalize_keys).collect()),
        scalar => scalar,
    }
}
