//! Fills in help text the flag synthesizer leaves blank for plain scalars
//! (`octl_flags::synth::walk` only presets help for `Time`/`Json` fields)
//! by consulting the OpenAPI document's per-attribute descriptions.

use octl_schema::SchemaView;
use octl_types::{FieldShape, Flag};
use std::collections::HashMap;

/// Maps a dotted field path with numeric slice indices stripped (e.g.
/// `BlockDeviceMappings.DeviceName`) to the record type name that field
/// lives on and its own field name, so each can be looked up against the
/// schema independently of how deep it sits in the request tree.
fn collect(shape: &FieldShape, prefix: &str, out: &mut HashMap<String, (String, String)>) {
    match shape {
        FieldShape::Record { type_name, fields } => {
            for field in fields {
                let path = if prefix.is_empty() {
                    field.name.clone()
                } else {
                    format!("{prefix}.{}", field.name)
                };
                out.insert(path.clone(), (type_name.clone(), field.name.clone()));
                collect(&field.shape, &path, out);
            }
        }
        FieldShape::SliceOfRecord { element } => {
            collect(element, prefix, out);
        }
        _ => {}
    }
}

/// Strips numeric segments from a dotted field path so it matches the
/// index-free keys `collect` builds (`BlockDeviceMappings.0.DeviceName`
/// -> `BlockDeviceMappings.DeviceName`).
fn strip_indices(field_path: &str) -> String {
    field_path
        .split('.')
        .filter(|seg| seg.parse::<usize>().is_err())
        .collect::<Vec<_>>()
        .join(".")
}

/// Enriches every flag with an empty `help` by looking up its owning
/// record type and field name in the schema's attribute descriptions.
/// Flags that already carry preset help (`Time`/`Json`) are left alone.
pub fn enrich(flags: &mut [Flag], root: &FieldShape, schema: &SchemaView) {
    let mut paths = HashMap::new();
    collect(root, "", &mut paths);

    for flag in flags.iter_mut() {
        if !flag.help.is_empty() {
            continue;
        }
        let key = strip_indices(&flag.field_path);
        if let Some((type_name, field_name)) = paths.get(&key) {
            let summary = schema.summary_for_attribute(type_name, field_name);
            if !summary.help.is_empty() {
                flag.help = summary.help;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octl_client::descriptor;
    use octl_flags::synthesize;

    #[test]
    fn enriches_a_top_level_scalar_flag_from_the_embedded_schema() {
        let op = descriptor::by_name("CreateVolume").expect("CreateVolume descriptor");
        let mut flags = synthesize(&op.input);
        let schema = SchemaView::load(include_str!("../assets/openapi.json")).expect("valid document");
        enrich(&mut flags, &op.input, &schema);

        let subregion = flags
            .iter()
            .find(|f| f.field_path == "SubregionName")
            .expect("SubregionName flag");
        assert!(!subregion.help.is_empty(), "expected schema-derived help text");
    }

    #[test]
    fn leaves_time_and_json_flags_with_their_preset_help_untouched() {
        let shape = FieldShape::Record {
            type_name: "Thing".to_string(),
            fields: vec![octl_types::FieldDef {
                name: "CreatedAt".to_string(),
                shape: FieldShape::Time,
                required: false,
            }],
        };
        let mut flags = synthesize(&shape);
        let schema = SchemaView::load(include_str!("../assets/openapi.json")).expect("valid document");
        let preset = flags[0].help.clone();
        enrich(&mut flags, &shape, &schema);
        assert_eq!(flags[0].help, preset);
    }
}
