//! The Flag Synthesizer (§4.2): a depth-first walk over a [`FieldShape`]
//! tree emitting a flat list of leaf [`Flag`]s.

use octl_types::field::{FieldShape, DEFAULT_SLICE_ENTRIES};
use octl_types::flag::{normalize_flag_name, CustomParser, Flag};
use std::collections::HashMap;

/// Synthesizes flags for `root` with the default slice-entry count
/// (`DEFAULT_SLICE_ENTRIES`) at every `SliceOfRecord` field.
pub fn synthesize(root: &FieldShape) -> Vec<Flag> {
    synthesize_with_visible_slices(root, &HashMap::new())
}

/// Synthesizes flags for `root`, overriding how many numbered entries a
/// `SliceOfRecord` field at a given field path exposes. `visible_slice_entries`
/// maps a field path (e.g. `"BlockDeviceMappings"`) to an entry count;
/// fields not present default to [`DEFAULT_SLICE_ENTRIES`].
///
/// This is how the index-visibility property in §8 is satisfied: a command
/// that notices the user supplied `--block-device-mappings.0.*` re-invokes
/// this with `{"BlockDeviceMappings": 2}` so index 1 appears on the next
/// `--help`.
pub fn synthesize_with_visible_slices(
    root: &FieldShape,
    visible_slice_entries: &HashMap<String, usize>,
) -> Vec<Flag> {
    let mut out = Vec::new();
    walk(root, "", "", true, visible_slice_entries, &mut out);
    out
}

fn walk(
    shape: &FieldShape,
    field_path: &str,
    flag_path: &str,
    required_ctx: bool,
    visible: &HashMap<String, usize>,
    out: &mut Vec<Flag>,
) {
    match shape {
        FieldShape::Record { fields, .. } => {
            for def in fields {
                let child_required = required_ctx && def.required;
                let field_path = join(field_path, &def.name);
                let flag_path = join(flag_path, &def.name);
                walk(&def.shape, &field_path, &flag_path, child_required, visible, out);
            }
        }
        FieldShape::Scalar { kind, allowed_values } => {
            out.push(
                Flag::new(normalize_flag_name(flag_path), field_path, *kind)
                    .required(required_ctx)
                    .allowed_values(allowed_values.clone()),
            );
        }
        FieldShape::Time => {
            out.push(
                Flag::new(normalize_flag_name(flag_path), field_path, octl_types::ScalarKind::String)
                    .required(required_ctx)
                    .with_parser(CustomParser::Time)
                    .help("RFC3339, ISO8601, duration, or signed offset (d/mo/y) from now".to_string()),
            );
        }
        FieldShape::Json => {
            out.push(
                Flag::new(normalize_flag_name(flag_path), field_path, octl_types::ScalarKind::String)
                    .required(required_ctx)
                    .with_parser(CustomParser::Json)
                    .help("raw JSON value".to_string()),
            );
        }
        FieldShape::SliceOfScalar { kind } => {
            out.push(
                Flag::new(normalize_flag_name(flag_path), field_path, *kind)
                    .slice()
                    .required(required_ctx),
            );
        }
        FieldShape::SliceOfRecord { element } => {
            let entries = visible.get(field_path).copied().unwrap_or(DEFAULT_SLICE_ENTRIES);
            for i in 0..entries {
                let field_path = format!("{field_path}.{i}");
                let flag_path = format!("{flag_path}.{i}");
                walk(element, &field_path, &flag_path, child_required_for_slice(required_ctx), visible, out);
            }
        }
    }
}

fn child_required_for_slice(required_ctx: bool) -> bool {
    // A slice element is only ever "required" in the sense that its parent
    // path is required; individual elements beyond index 0 are opt-in by
    // construction (the user had to ask for them), so required-ness still
    // flows from the path, not from presence.
    required_ctx
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octl_types::field::{FieldDef, ScalarKind};

    fn bsu() -> FieldShape {
        FieldShape::record(
            "BsuToCreate",
            vec![FieldDef::new(
                "DeleteOnVmDeletion",
                FieldShape::Scalar {
                    kind: ScalarKind::Bool,
                    allowed_values: Vec::new(),
                },
                false,
            )],
        )
    }

    fn block_device_mapping() -> FieldShape {
        FieldShape::record(
            "BlockDeviceMapping",
            vec![FieldDef::new("Bsu", bsu(), false)],
        )
    }

    fn request_with_slice() -> FieldShape {
        FieldShape::record(
            "CreateVmsRequest",
            vec![FieldDef::new(
                "BlockDeviceMappings",
                FieldShape::SliceOfRecord {
                    element: Box::new(block_device_mapping()),
                },
                false,
            )],
        )
    }

    #[test]
    fn default_synthesis_exposes_only_index_zero() {
        let flags = synthesize(&request_with_slice());
        assert!(flags
            .iter()
            .any(|f| f.name == "block-device-mappings.0.bsu.delete-on-vm-deletion"));
        assert!(!flags
            .iter()
            .any(|f| f.name == "block-device-mappings.1.bsu.delete-on-vm-deletion"));
    }

    #[test]
    fn visible_override_exposes_index_one() {
        let mut visible = HashMap::new();
        visible.insert("BlockDeviceMappings".to_string(), 2);
        let flags = synthesize_with_visible_slices(&request_with_slice(), &visible);
        assert!(flags
            .iter()
            .any(|f| f.name == "block-device-mappings.1.bsu.delete-on-vm-deletion"));
    }

    #[test]
    fn required_propagates_multiplicatively() {
        let shape = FieldShape::record(
            "CreateVolumeRequest",
            vec![
                FieldDef::new(
                    "Size",
                    FieldShape::Scalar {
                        kind: ScalarKind::Int,
                        allowed_values: Vec::new(),
                    },
                    true,
                ),
                FieldDef::new(
                    "Optional",
                    FieldShape::record(
                        "Nested",
                        vec![FieldDef::new(
                            "Inner",
                            FieldShape::Scalar {
                                kind: ScalarKind::String,
                                allowed_values: Vec::new(),
                            },
                            true,
                        )],
                    ),
                    false,
                ),
            ],
        );
        let flags = synthesize(&shape);
        let size = flags.iter().find(|f| f.field_path == "Size").unwrap();
        assert!(size.required);
        let inner = flags.iter().find(|f| f.field_path == "Optional.Inner").unwrap();
        assert!(!inner.required, "required must not propagate past an optional ancestor");
    }
}
