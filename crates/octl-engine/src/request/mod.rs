//! The Request Builder (§4.6): assembles the target operation's input
//! record from an optional JSON base plus dotted-path flag assignments.

pub mod template;

use crate::error::{Error, Result};
use octl_types::flag::Flag;
use serde_json::Value;

/// A single flag the user explicitly set, already type-coerced by the
/// caller according to the flag's declared kind (§4.6 step 2, "type
/// coercion follows the flag's declared kind" — the CLI layer owns
/// coercion since it's the one holding clap's typed `ArgMatches`).
#[derive(Debug, Clone)]
pub struct ChangedFlag {
    pub field_path: String,
    pub value: Value,
}

impl ChangedFlag {
    pub fn new(field_path: impl Into<String>, value: Value) -> Self {
        ChangedFlag {
            field_path: field_path.into(),
            value,
        }
    }
}

/// Builds the request record: starts from `base` (decoded from
/// `--template`/stdin per [`template::decode_base`], or an empty object),
/// applies each changed flag's dotted-path assignment in order, then
/// validates that every required flag resolved to a present value.
pub fn build_request(base: Option<Value>, changed: &[ChangedFlag], flags: &[Flag]) -> Result<Value> {
    let mut record = base.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    for flag in changed {
        assign_path(&mut record, &flag.field_path, flag.value.clone());
    }
    validate_required(&record, flags)?;
    Ok(record)
}

/// Splits `path` on `.` and walks `record`, creating intermediate objects
/// or arrays as needed; numeric segments index (and extend, with `null`
/// placeholders) an array rather than an object key (§4.6 step 2, §9
/// "Dotted field paths & slice indices").
pub fn assign_path(record: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    assign_segments(record, &segments, value);
}

fn assign_segments(current: &mut Value, segments: &[&str], value: Value) {
    if segments.len() == 1 {
        set_in_place(current, segments[0], value);
        return;
    }
    let child = child_slot(current, segments[0]);
    assign_segments(child, &segments[1..], value);
}

fn set_in_place(current: &mut Value, segment: &str, value: Value) {
    if let Ok(index) = segment.parse::<usize>() {
        ensure_array(current);
        let arr = current.as_array_mut().expect("ensured array");
        extend_with_nulls(arr, index);
        arr[index] = value;
    } else {
        ensure_object(current);
        current
            .as_object_mut()
            .expect("ensured object")
            .insert(segment.to_string(), value);
    }
}

fn child_slot<'a>(current: &'a mut Value, segment: &str) -> &'a mut Value {
    if let Ok(index) = segment.parse::<usize>() {
        ensure_array(current);
        let arr = current.as_array_mut().expect("ensured array");
        extend_with_nulls(arr, index);
        if arr[index].is_null() {
            arr[index] = Value::Object(serde_json::Map::new());
        }
        &mut arr[index]
    } else {
        ensure_object(current);
        let obj = current.as_object_mut().expect("ensured object");
        let slot = obj.entry(segment.to_string()).or_insert(Value::Null);
        if slot.is_null() {
            *slot = Value::Object(serde_json::Map::new());
        }
        slot
    }
}

fn ensure_array(current: &mut Value) {
    if !current.is_array() {
        *current = Value::Array(Vec::new());
    }
}

fn ensure_object(current: &mut Value) {
    if !current.is_object() {
        *current = Value::Object(serde_json::Map::new());
    }
}

fn extend_with_nulls(arr: &mut Vec<Value>, index: usize) {
    while arr.len() <= index {
        arr.push(Value::Null);
    }
}

/// After assignment, every required flag's field path must resolve to a
/// present, non-null value (§4.6 step 4): "missing required fields cause
/// immediate failure before the call".
pub fn validate_required(record: &Value, flags: &[Flag]) -> Result<()> {
    let missing: Vec<String> = flags
        .iter()
        .filter(|f| f.required)
        .filter(|f| !path_present(record, &f.field_path))
        .map(|f| f.name.clone())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingRequired(missing))
    }
}

fn path_present(record: &Value, path: &str) -> bool {
    let mut current = record;
    for segment in path.split('.') {
        let next = if let Ok(index) = segment.parse::<usize>() {
            current.as_array().and_then(|a| a.get(index))
        } else {
            current.as_object().and_then(|o| o.get(segment))
        };
        match next {
            Some(value) => current = value,
            None => return false,
        }
    }
    !current.is_null()
}

#[cfg(test)]
mod tests {
    use super::*;
    use octl_types::field::ScalarKind;
    use serde_json::json;

    #[test]
    fn assigns_nested_scalar_creating_intermediate_objects() {
        let mut record = json!({});
        assign_path(&mut record, "Filters.VolumeTypes", json!(["standard"]));
        assert_eq!(record, json!({"Filters": {"VolumeTypes": ["standard"]}}));
    }

    #[test]
    fn assigns_slice_index_extending_with_nulls() {
        let mut record = json!({});
        assign_path(&mut record, "BlockDeviceMappings.1.DeviceName", json!("/dev/sdb"));
        let mappings = record["BlockDeviceMappings"].as_array().unwrap();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0], Value::Null);
        assert_eq!(mappings[1]["DeviceName"], json!("/dev/sdb"));
    }

    #[test]
    fn round_trip_build_equals_template_equivalent() {
        let flags = vec![Flag::new("size", "Size", ScalarKind::Int).required(true)];
        let from_flags = build_request(
            None,
            &[ChangedFlag::new("SubregionName", json!("eu-west-2a")), ChangedFlag::new("Size", json!(4))],
            &flags,
        )
        .unwrap();
        let from_template = json!({"SubregionName": "eu-west-2a", "Size": 4});
        assert_eq!(from_flags, from_template);
    }

    #[test]
    fn missing_required_flag_fails() {
        let flags = vec![Flag::new("size", "Size", ScalarKind::Int).required(true)];
        let err = build_request(None, &[], &flags).unwrap_err();
        assert!(matches!(err, Error::MissingRequired(_)));
    }
}
