//! Structural comparison.

use crate::value::Value;

use super::EqualityPolicy;

/// Tuning for structural comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    /// Compare map, set and byte-buffer values by content. When disabled
    /// those variants only compare by identity.
    pub collections: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self { collections: true }
    }
}

/// Compare two values under `policy` with default options.
pub fn equal(a: &Value, b: &Value, policy: EqualityPolicy) -> bool {
    equal_with(a, b, policy, CompareOptions::default())
}

/// Compare two values under `policy`.
pub fn equal_with(a: &Value, b: &Value, policy: EqualityPolicy, options: CompareOptions) -> bool {
    compare(a, b, policy.depth_budget(), options)
}

/// Compare two input tuples elementwise.
///
/// The policy applies to each element, so depth is counted below the tuple.
pub fn equal_tuples(a: &[Value], b: &[Value], policy: EqualityPolicy) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equal(x, y, policy))
}

/// `budget` is the number of container levels that may still be opened;
/// `None` is unbounded.
fn compare(a: &Value, b: &Value, budget: Option<usize>, options: CompareOptions) -> bool {
    if a.same_identity(b) {
        return true;
    }

    let next = match budget {
        Some(0) => return false,
        Some(n) => Some(n - 1),
        None => None,
    };

    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| compare(l, r, next, options))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(key, l)| {
                    y.get(key).is_some_and(|r| compare(l, r, next, options))
                })
        }
        (Value::Map(x), Value::Map(y)) if options.collections => {
            x.len() == y.len()
                && x.iter().all(|(key, l)| {
                    y.iter().any(|(other, r)| {
                        compare(key, other, next, options) && compare(l, r, next, options)
                    })
                })
        }
        (Value::Set(x), Value::Set(y)) if options.collections => {
            x.len() == y.len()
                && x.iter()
                    .all(|member| y.iter().any(|other| compare(member, other, next, options)))
        }
        (Value::Bytes(x), Value::Bytes(y)) if options.collections => x[..] == y[..],
        _ => false,
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const POLICIES: [EqualityPolicy; 4] = [
        EqualityPolicy::Reference,
        EqualityPolicy::Shallow(1),
        EqualityPolicy::Shallow(3),
        EqualityPolicy::Deep,
    ];

    fn items() -> Value {
        Value::from(json!([
            { "name": "apple", "value": 1.20 },
            { "name": "orange", "value": 0.95 }
        ]))
    }

    #[test]
    fn every_value_equals_itself() {
        let samples = [
            Value::Null,
            Value::from(true),
            Value::Number(f64::NAN),
            Value::from("text"),
            items(),
            Value::map([(Value::from(1), items())]),
            Value::set([1, 2]),
            Value::bytes(vec![1, 2, 3]),
        ];
        for value in &samples {
            for policy in POLICIES {
                assert!(equal(value, value, policy), "{value:?} under {policy:?}");
            }
        }
    }

    #[test]
    fn copied_container_is_shallow_equal_but_not_identical() {
        let original = items();
        let copy = Value::array(original.as_array().unwrap().iter().cloned());

        assert!(!equal(&original, &copy, EqualityPolicy::Reference));
        assert!(equal(&original, &copy, EqualityPolicy::Shallow(1)));
        assert!(equal(&original, &copy, EqualityPolicy::Deep));
    }

    #[test]
    fn cloned_elements_need_more_depth() {
        let original = items();
        let cloned = Value::from(json!([
            { "name": "apple", "value": 1.20 },
            { "name": "orange", "value": 0.95 }
        ]));

        assert!(!equal(&original, &cloned, EqualityPolicy::Shallow(1)));
        assert!(equal(&original, &cloned, EqualityPolicy::Shallow(2)));
        assert!(equal(&original, &cloned, EqualityPolicy::Deep));
    }

    #[test]
    fn shallow_zero_is_identity() {
        let a = Value::array([1]);
        let b = Value::array([1]);
        assert!(!equal(&a, &b, EqualityPolicy::Shallow(0)));
    }

    #[test]
    fn nan_members_are_equal() {
        let a = Value::array([Value::Number(f64::NAN)]);
        let b = Value::array([Value::Number(f64::NAN)]);
        assert!(equal(&a, &b, EqualityPolicy::Shallow(1)));
    }

    #[test]
    fn objects_need_the_same_key_set() {
        let a = Value::from(json!({ "a": 1, "b": 2 }));
        let b = Value::from(json!({ "b": 2, "a": 1 }));
        let c = Value::from(json!({ "a": 1, "c": 2 }));
        let d = Value::from(json!({ "a": 1 }));

        assert!(equal(&a, &b, EqualityPolicy::Deep));
        assert!(!equal(&a, &c, EqualityPolicy::Deep));
        assert!(!equal(&a, &d, EqualityPolicy::Deep));
    }

    #[test]
    fn different_tags_never_match() {
        let array = Value::array([1, 2]);
        let set = Value::set([1, 2]);
        assert!(!equal(&array, &set, EqualityPolicy::Deep));
        assert!(!equal(&Value::Null, &Value::from(false), EqualityPolicy::Deep));
    }

    #[test]
    fn collections_compare_by_content_when_enabled() {
        let a = Value::map([(Value::from("k"), Value::from(1))]);
        let b = Value::map([(Value::from("k"), Value::from(1))]);
        let opts_off = CompareOptions { collections: false };

        assert!(equal(&a, &b, EqualityPolicy::Shallow(1)));
        assert!(!equal_with(&a, &b, EqualityPolicy::Deep, opts_off));

        let x = Value::set([1, 2]);
        let y = Value::set([2, 1]);
        assert!(equal(&x, &y, EqualityPolicy::Shallow(1)));
        assert!(!equal_with(&x, &y, EqualityPolicy::Shallow(1), opts_off));

        let p = Value::bytes(vec![7, 8]);
        let q = Value::bytes(vec![7, 8]);
        assert!(equal(&p, &q, EqualityPolicy::Shallow(1)));
        assert!(!equal(&p, &Value::bytes(vec![7]), EqualityPolicy::Deep));
    }

    #[test]
    fn nested_set_members_and_map_keys_follow_the_depth_budget() {
        let x = Value::set([Value::array([1, 2])]);
        let y = Value::set([Value::array([1, 2])]);
        assert!(!equal(&x, &y, EqualityPolicy::Shallow(1)));
        assert!(equal(&x, &y, EqualityPolicy::Shallow(2)));
        assert!(equal(&x, &y, EqualityPolicy::Deep));
        assert!(!equal(&x, &Value::set([Value::array([1, 3])]), EqualityPolicy::Deep));

        let a = Value::map([(Value::array([1]), Value::from(1))]);
        let b = Value::map([(Value::array([1]), Value::from(1))]);
        assert!(!equal(&a, &b, EqualityPolicy::Shallow(1)));
        assert!(equal(&a, &b, EqualityPolicy::Deep));
        assert!(!equal(&a, &Value::map([(Value::array([1]), Value::from(2))]), EqualityPolicy::Deep));
        assert!(!equal(&a, &Value::map([(Value::array([2]), Value::from(1))]), EqualityPolicy::Deep));

        let shared = Value::array([1, 2]);
        let p = Value::set([shared.clone()]);
        let q = Value::set([shared]);
        assert!(equal(&p, &q, EqualityPolicy::Shallow(1)));
    }

    #[test]
    fn comparison_is_symmetric() {
        let a = Value::from(json!({ "x": [1, 2, { "y": 3 }] }));
        let b = Value::from(json!({ "x": [1, 2, { "y": 4 }] }));
        for policy in POLICIES {
            assert_eq!(equal(&a, &b, policy), equal(&b, &a, policy));
        }
    }

    #[test]
    fn tuples_compare_per_element() {
        let shared = items();
        let copy = Value::array(shared.as_array().unwrap().iter().cloned());

        let previous = [shared.clone(), Value::from(8)];
        let next = [copy, Value::from(8)];

        assert!(!equal_tuples(&previous, &next, EqualityPolicy::Reference));
        assert!(equal_tuples(&previous, &next, EqualityPolicy::Shallow(1)));
        assert!(!equal_tuples(&previous, &next[..1], EqualityPolicy::Deep));
    }
}
