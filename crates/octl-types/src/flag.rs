use crate::field::ScalarKind;
use serde::{Deserialize, Serialize};

/// A custom parser a [`Flag`] may carry in place of its plain scalar kind.
///
/// `Time` backs the RFC3339/ISO8601/duration/offset parser (§4.2); `Json`
/// backs the "custom JSON" capability, where the whole flag value is parsed
/// as JSON at request-build time rather than coerced to a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomParser {
    Time,
    Json,
}

/// A leaf in the synthesized flag tree (§3 Data Model, "Flag").
///
/// Names are unique within a command; `field_path` uniquely identifies a
/// slot in the request record and is shared vocabulary with the Request
/// Builder — the same dotted-path-with-numeric-indices syntax assigns a
/// value back into the record that this flag was synthesized from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    /// External, user-facing name (e.g. `block-device-mappings.0.device-name`).
    pub name: String,
    /// Internal field path into the request record (e.g.
    /// `BlockDeviceMappings.0.DeviceName`), used by the Request Builder.
    pub field_path: String,
    pub kind: ScalarKind,
    pub slice: bool,
    pub help: String,
    pub required: bool,
    /// Enumerated allowed values, if any; empty means unconstrained.
    pub allowed_values: Vec<String>,
    pub custom_parser: Option<CustomParser>,
}

impl Flag {
    pub fn new(name: impl Into<String>, field_path: impl Into<String>, kind: ScalarKind) -> Self {
        Flag {
            name: name.into(),
            field_path: field_path.into(),
            kind,
            slice: false,
            help: String::new(),
            required: false,
            allowed_values: Vec::new(),
            custom_parser: None,
        }
    }

    pub fn slice(mut self) -> Self {
        self.slice = true;
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn allowed_values(mut self, values: Vec<String>) -> Self {
        self.allowed_values = values;
        self
    }

    pub fn with_parser(mut self, parser: CustomParser) -> Self {
        self.custom_parser = Some(parser);
        self
    }

    pub fn is_time(&self) -> bool {
        matches!(self.custom_parser, Some(CustomParser::Time))
    }

    pub fn is_json(&self) -> bool {
        matches!(self.custom_parser, Some(CustomParser::Json))
    }
}

/// Rewrites a CamelCase field name into the kebab-case external flag name,
/// collapsing slice-index infixes the way `<Field>.<N>.<SubField>` does in
/// the field path (§4.2: "collapsing `s.0` infixes").
///
/// Numeric path segments pass through unchanged; everything else is
/// lower-kebabed on word boundaries.
pub fn normalize_flag_name(field_path: &str) -> String {
    field_path
        .split('.')
        .map(|segment| {
            if segment.chars().all(|c| c.is_ascii_digit()) {
                segment.to_string()
            } else {
                camel_to_kebab(segment)
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn camel_to_kebab(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.char_indices() {
        if c.is_uppercase() && i > 0 {
            out.push('-');
        }
        out.extend(c.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_simple_field() {
        assert_eq!(normalize_flag_name("DeviceName"), "device-name");
    }

    #[test]
    fn normalizes_nested_path_with_slice_index() {
        assert_eq!(
            normalize_flag_name("BlockDeviceMappings.0.DeviceName"),
            "block-device-mappings.0.device-name"
        );
    }

    #[test]
    fn flag_builder_sets_fields() {
        let flag = Flag::new("size", "Size", ScalarKind::Int)
            .help("volume size in GiB")
            .required(true);
        assert!(flag.required);
        assert_eq!(flag.help, "volume size in GiB");
        assert!(!flag.slice);
    }
}
