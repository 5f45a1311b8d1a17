//! Schema View: an adapter over the parsed OpenAPI document.
//!
//! `oas3::Spec` gives us a typed, validated parse for free — we lean on its
//! `Deserialize` impl to confirm the document is structurally sound, but do
//! attribute lookups against a parallel `serde_json::Value` tree rather than
//! `oas3`'s own `Components`/`Schema` types. OpenAPI's own shapes are wide
//! and version-sensitive; a raw JSON walk is the safer way to answer two
//! narrow questions (operation summary, attribute summary) without betting
//! the behavior of this crate on every field name `oas3` happens to expose.

pub mod error;

pub use error::{Error, Result};

use serde_json::Value;

/// Result of `SummaryForOperation` (§4.1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationSummary {
    pub short: String,
    pub long: String,
    pub group: String,
    pub found: bool,
}

/// Result of `SummaryForAttribute` (§4.1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSummary {
    pub help: String,
    pub required: bool,
}

/// A loaded OpenAPI document, queryable by operation name and by
/// (type name, field name).
pub struct SchemaView {
    raw: Value,
}

impl SchemaView {
    /// Parses and validates `document` (JSON text). Validation is
    /// fail-fast: a document `oas3` cannot deserialize is a startup error
    /// (§7 error kind 2, "schema / introspection — fatal at startup").
    pub fn load(document: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(document)?;
        let _validated: oas3::Spec = serde_json::from_value(raw.clone())?;
        Ok(SchemaView { raw })
    }

    /// Locates the operation whose `operationId` matches `name` anywhere in
    /// `paths`. Maps its first tag to a group id (lowercased,
    /// whitespace-normalized). Fails soft: an absent operation returns
    /// `found: false` with empty strings rather than an error.
    pub fn summary_for_operation(&self, name: &str) -> OperationSummary {
        let Some(paths) = self.raw.get("paths").and_then(Value::as_object) else {
            return OperationSummary::default();
        };
        for path_item in paths.values() {
            let Some(path_item) = path_item.as_object() else {
                continue;
            };
            for method_value in path_item.values() {
                let Some(op) = method_value.as_object() else {
                    continue;
                };
                let Some(op_id) = op.get("operationId").and_then(Value::as_str) else {
                    continue;
                };
                if op_id != name {
                    continue;
                }
                let short = op
                    .get("summary")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let long = op
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let group = op
                    .get("tags")
                    .and_then(Value::as_array)
                    .and_then(|tags| tags.first())
                    .and_then(Value::as_str)
                    .map(normalize_group)
                    .unwrap_or_default();
                return OperationSummary {
                    short,
                    long,
                    group,
                    found: true,
                };
            }
        }
        OperationSummary::default()
    }

    /// Locates `typeName` under `components.schemas`, resolves `fieldName`
    /// among its properties, and returns its description plus whether it
    /// appears in the schema's `required` list. Fails soft (§4.1).
    ///
    /// Tries `typeName` as given first, then `<typeName>Request` — the
    /// conventional mapping when an operation's request type name differs
    /// from the operation name itself (e.g. `CreateVolume` →
    /// `CreateVolumeRequest`).
    pub fn summary_for_attribute(&self, type_name: &str, field_name: &str) -> AttributeSummary {
        for candidate in [type_name.to_string(), format!("{type_name}Request")] {
            if let Some(summary) = self.lookup_attribute(&candidate, field_name) {
                return summary;
            }
        }
        AttributeSummary::default()
    }

    fn lookup_attribute(&self, type_name: &str, field_name: &str) -> Option<AttributeSummary> {
        let schema = self
            .raw
            .get("components")?
            .get("schemas")?
            .get(type_name)?
            .as_object()?;
        let properties = schema.get("properties")?.as_object()?;
        let property = properties.get(field_name)?;
        let help = property
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .any(|v| v.as_str() == Some(field_name))
            })
            .unwrap_or(false);
        Some(AttributeSummary { help, required })
    }
}

fn normalize_group(tag: &str) -> String {
    tag.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> &'static str {
        r#"{
            "openapi": "3.1.0",
            "info": {"title": "Sample", "version": "1.0.0"},
            "paths": {
                "/CreateVolume": {
                    "post": {
                        "operationId": "CreateVolume",
                        "summary": "Create a volume",
                        "description": "Creates a new volume.",
                        "tags": ["Storage  Volumes"]
                    }
                }
            },
            "components": {
                "schemas": {
                    "CreateVolumeRequest": {
                        "required": ["Size"],
                        "properties": {
                            "Size": {"type": "integer", "description": "Size in GiB"},
                            "Type": {"type": "string", "description": "Volume type"}
                        }
                    }
                }
            }
        }"#
    }

    #[test]
    fn finds_operation_by_operation_id() {
        let view = SchemaView::load(sample_document()).expect("load");
        let summary = view.summary_for_operation("CreateVolume");
        assert!(summary.found);
        assert_eq!(summary.short, "Create a volume");
        assert_eq!(summary.group, "storage volumes");
    }

    #[test]
    fn missing_operation_fails_soft() {
        let view = SchemaView::load(sample_document()).expect("load");
        let summary = view.summary_for_operation("DeleteVolume");
        assert!(!summary.found);
        assert_eq!(summary.short, "");
    }

    #[test]
    fn resolves_attribute_via_request_suffix_convention() {
        let view = SchemaView::load(sample_document()).expect("load");
        let summary = view.summary_for_attribute("CreateVolume", "Size");
        assert_eq!(summary.help, "Size in GiB");
        assert!(summary.required);

        let summary = view.summary_for_attribute("CreateVolume", "Type");
        assert!(!summary.required);
    }

    #[test]
    fn missing_attribute_fails_soft() {
        let view = SchemaView::load(sample_document()).expect("load");
        let summary = view.summary_for_attribute("CreateVolume", "Nope");
        assert_eq!(summary.help, "");
        assert!(!summary.required);
    }
}
