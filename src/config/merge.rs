use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::foundation::error::{PensieveError, PensieveResult};

/// Deep-merge `source` onto `target` in place.
///
/// - arrays replace wholesale;
/// - objects recurse, replacing a non-object target with an empty object first;
/// - every other value (including `null`) overwrites.
///
/// Keys absent from `source` are "not specified" and leave the target untouched.
/// A non-object `source` is ignored.
pub fn deep_merge(target: &mut Value, source: &Value) {
    let Value::Object(src) = source else {
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    let Value::Object(dst) = target else {
        return;
    };

    for (key, sv) in src {
        match sv {
            Value::Array(items) => {
                dst.insert(key.clone(), Value::Array(items.clone()));
            }
            Value::Object(_) => {
                let slot = dst
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                deep_merge(slot, sv);
            }
            other => {
                dst.insert(key.clone(), other.clone());
            }
        }
    }
}

/// Build a typed options struct from its defaults plus a partial JSON override.
pub fn merged<T>(overrides: &Value) -> PensieveResult<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    merge_onto(T::default(), overrides)
}

/// Like [`merged`], starting from an explicit base instead of `T::default()`.
pub fn merge_onto<T>(base: T, overrides: &Value) -> PensieveResult<T>
where
    T: Serialize + DeserializeOwned,
{
    if overrides.is_null() {
        return Ok(base);
    }
    if !overrides.is_object() {
        return Err(PensieveError::config(format!(
            "options must be a JSON object, got {}",
            kind_name(overrides)
        )));
    }
    let mut value = serde_json::to_value(base)?;
    deep_merge(&mut value, overrides);
    serde_json::from_value(value).map_err(|e| PensieveError::config(e.to_string()))
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/merge.rs"]
mod tests;
