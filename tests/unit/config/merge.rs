use super::*;
use serde_json::json;

#[test]
fn nested_partial_override_keeps_siblings() {
    let mut target = json!({ "a": { "x": 1, "y": 2 } });
    deep_merge(&mut target, &json!({ "a": { "x": 5 } }));
    assert_eq!(target, json!({ "a": { "x": 5, "y": 2 } }));
}

#[test]
fn arrays_replace_wholesale() {
    let mut target = json!({ "a": [1, 2, 3] });
    deep_merge(&mut target, &json!({ "a": [9] }));
    assert_eq!(target, json!({ "a": [9] }));
}

#[test]
fn object_over_scalar_creates_object() {
    let mut target = json!({ "a": 3 });
    deep_merge(&mut target, &json!({ "a": { "b": true } }));
    assert_eq!(target, json!({ "a": { "b": true } }));
}

#[test]
fn missing_keys_are_created_and_null_overwrites() {
    let mut target = json!({ "keep": 1, "gone": 2 });
    deep_merge(&mut target, &json!({ "new": { "n": 1 }, "gone": null }));
    assert_eq!(target, json!({ "keep": 1, "gone": null, "new": { "n": 1 } }));
}

#[test]
fn non_object_source_is_ignored() {
    let mut target = json!({ "a": 1 });
    deep_merge(&mut target, &json!(7));
    assert_eq!(target, json!({ "a": 1 }));
}

#[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Opts {
    max_particles: u32,
    line_width: crate::foundation::math::Range,
    tints: Vec<f64>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            max_particles: 70,
            line_width: crate::foundation::math::Range::new(1.6, 2.6),
            tints: vec![0.1, 0.2, 0.3],
        }
    }
}

#[test]
fn typed_merge_applies_field_rules() {
    let opts: Opts = merged(&json!({ "lineWidth": { "max": 3.4 }, "tints": [0.9] })).unwrap();
    assert_eq!(opts.max_particles, 70);
    assert_eq!(opts.line_width.min, 1.6);
    assert_eq!(opts.line_width.max, 3.4);
    assert_eq!(opts.tints, vec![0.9]);
}

#[test]
fn typed_merge_null_means_defaults() {
    let opts: Opts = merged(&serde_json::Value::Null).unwrap();
    assert_eq!(opts, Opts::default());
}

#[test]
fn typed_merge_rejects_wrong_types() {
    let err = merged::<Opts>(&json!({ "maxParticles": "lots" })).unwrap_err();
    assert!(matches!(err, PensieveError::Config(_)));
    let err = merged::<Opts>(&json!([1, 2])).unwrap_err();
    assert!(matches!(err, PensieveError::Config(_)));
}
