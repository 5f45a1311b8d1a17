use crate::field::FieldShape;
use serde::{Deserialize, Serialize};

/// How a [`Operation`] drives paging, derived from which pagination-contract
/// fields its request/response carry (§6 "Pagination contract").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingKind {
    /// Request carries `NextPageToken`; response's presence/absence of the
    /// same field signals more pages.
    Token,
    /// Request carries `FirstItem`; response's `HasMoreItems` signals more
    /// pages.
    FirstItem,
    /// Neither field present: a single call, no pager.
    None,
}

/// A named call discovered by reflection on a client type in the original;
/// here, a row of the build-time descriptor table (§9 Design Notes,
/// §EXPANSION 1). Attributes mirror §3 Data Model's "Operation": name,
/// input shape, output shape, paging kind. Enumerated at startup,
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    /// Schema-view group tag (first OpenAPI operation tag, lowercased).
    pub group: String,
    pub input: FieldShape,
    pub output: FieldShape,
    pub paging: PagingKind,
    /// Response field name holding the slice of records to yield, if any
    /// (the Page Reader's `contentField`); absent for single-record
    /// responses.
    pub content_field: Option<String>,
}

impl Operation {
    pub fn input_fields(&self) -> &[crate::field::FieldDef] {
        match &self.input {
            FieldShape::Record { fields, .. } => fields,
            _ => &[],
        }
    }
}
