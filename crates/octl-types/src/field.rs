use serde::{Deserialize, Serialize};

/// Scalar kinds the Flag Synthesizer (`octl-flags`) can turn into a leaf flag.
///
/// Only bool/int/string leaves ever become flags; everything else is either
/// a record to recurse into or a capability (time, custom-JSON) intercepted
/// before the generic struct/slice cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Bool,
    Int,
    String,
}

/// How many slice indices the synthesizer materializes into flags for a
/// slice-of-record field by default. Kept in sync with the test fixture that
/// requires index 0 present and index 1 absent in default help (§8).
pub const DEFAULT_SLICE_ENTRIES: usize = 1;

/// The shape of one field in a request or response record, standing in for
/// a runtime type-reflection walk over a typed SDK client. Built once, by
/// hand, per operation in `octl-client::descriptor` (§9 "build-time
/// descriptor table").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum FieldShape {
    /// A plain scalar leaf.
    Scalar {
        kind: ScalarKind,
        /// Enumerated values, if this scalar is drawn from an OpenAPI enum.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        allowed_values: Vec<String>,
    },
    /// A time-typed scalar: RFC3339/ISO8601/duration/offset string, per §4.2.
    Time,
    /// A record satisfying the "custom JSON" capability: captured as a
    /// single string flag, parsed as JSON at request-build time.
    Json,
    /// A nested record. `type_name` is the OpenAPI component name used for
    /// `SummaryForAttribute` lookups.
    Record {
        type_name: String,
        fields: Vec<FieldDef>,
    },
    /// A slice of scalars: collapses into one comma-separated flag.
    SliceOfScalar { kind: ScalarKind },
    /// A slice of records: synthesized as `DEFAULT_SLICE_ENTRIES` numbered
    /// copies of the element shape (§4.2, §8's `BlockDeviceMappings` test).
    SliceOfRecord { element: Box<FieldShape> },
}

/// One named field within a [`FieldShape::Record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub shape: FieldShape,
    /// Whether the OpenAPI schema lists this field as required on its
    /// *own* record. Multiplicative propagation with ancestors happens in
    /// the synthesizer, not here (§4.2).
    pub required: bool,
}

impl FieldShape {
    pub fn record(type_name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        FieldShape::Record {
            type_name: type_name.into(),
            fields,
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, FieldShape::Record { .. })
    }
}

impl FieldDef {
    pub fn new(name: impl Into<String>, shape: FieldShape, required: bool) -> Self {
        FieldDef {
            name: name.into(),
            shape,
            required,
        }
    }
}
