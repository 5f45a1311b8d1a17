use serde::{Deserialize, Serialize};

/// The materialized input for one iteration of paging (§3 Data Model,
/// "Page Request").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageRequest {
    /// Token paging: opaque cursor from the previous response, `None` on
    /// the first call.
    Token(Option<String>),
    /// First-item paging: running count of items yielded so far.
    FirstItem(i64),
    /// No paging contract: exactly one call is ever made.
    None,
}

impl PageRequest {
    pub fn initial_for(kind: crate::operation::PagingKind) -> Self {
        match kind {
            crate::operation::PagingKind::Token => PageRequest::Token(None),
            crate::operation::PagingKind::FirstItem => PageRequest::FirstItem(0),
            crate::operation::PagingKind::None => PageRequest::None,
        }
    }
}

/// A single yielded record from the pipeline (§3 Data Model, "Result Item").
///
/// `SingleEntry` indicates the pipeline should treat the whole stream as a
/// scalar rather than an array, per the Formatter's single-wrapping
/// property (§8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultItem {
    Value {
        payload: serde_json::Value,
        single_entry: bool,
    },
    Error(String),
}

impl ResultItem {
    pub fn value(payload: serde_json::Value) -> Self {
        ResultItem::Value {
            payload,
            single_entry: false,
        }
    }

    pub fn single(payload: serde_json::Value) -> Self {
        ResultItem::Value {
            payload,
            single_entry: true,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResultItem::Error(_))
    }
}
