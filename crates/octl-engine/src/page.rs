//! The Page Reader (§4.7): drives repeated calls against an operation,
//! advancing the request's pagination field from the previous response,
//! and yields each item to a consumer-driven callback. Bounded at
//! [`MAX_PAGES`] (§6, "MaxPages=20") to guard against a misbehaving
//! response that never signals completion.

use crate::error::Result;
use octl_client::FakeCloud;
use octl_types::operation::{Operation, PagingKind};
use octl_types::page::{PageRequest, ResultItem};
use serde_json::{json, Value};

/// Hard ceiling on pages read for a single operation invocation (§6).
pub const MAX_PAGES: usize = 20;

pub struct PageReader<'a> {
    cloud: &'a FakeCloud,
    operation: &'a Operation,
}

impl<'a> PageReader<'a> {
    pub fn new(cloud: &'a FakeCloud, operation: &'a Operation) -> Self {
        PageReader { cloud, operation }
    }

    /// Single round trip, no paging loop — used for operations with
    /// [`PagingKind::None`] and for any call the caller wants to make
    /// exactly once regardless of the operation's paging kind (the "Raw"
    /// variant, §4.7).
    pub fn read_raw(&self, request: &Value) -> ResultItem {
        match self.cloud.call(&self.operation.name, request) {
            Ok(response) => ResultItem::single(response),
            Err(err) => ResultItem::Error(err.to_string()),
        }
    }

    /// Lazily walks every page, invoking `on_item` for each yielded record.
    /// `on_item` returns `true` to continue, `false` to stop early (the
    /// consumer-driven half of §5's single-threaded, demand-pulled
    /// pipeline). Silently stops after [`MAX_PAGES`] pages rather than
    /// erroring, matching the rest of this pipeline's fail-soft posture
    /// (recorded as an Open Question decision in DESIGN.md).
    pub fn read_paginated(&self, mut request: Value, mut on_item: impl FnMut(ResultItem) -> bool) -> Result<()> {
        if self.operation.content_field.is_none() || self.operation.paging == PagingKind::None {
            on_item(self.read_raw(&request));
            return Ok(());
        }

        let content_field = self.operation.content_field.as_deref().expect("checked above");
        let mut page_request = PageRequest::initial_for(self.operation.paging);
        let mut yielded: i64 = 0;

        for page_number in 0..MAX_PAGES {
            apply_page_request(&mut request, &page_request);
            tracing::debug!(operation = %self.operation.name, page_number, "reading page");
            let response = match self.cloud.call(&self.operation.name, &request) {
                Ok(response) => response,
                Err(err) => {
                    on_item(ResultItem::Error(err.to_string()));
                    return Ok(());
                }
            };

            let items = match response.get(content_field).and_then(Value::as_array) {
                Some(items) => items.clone(),
                None => {
                    on_item(ResultItem::single(response));
                    return Ok(());
                }
            };

            for item in items {
                yielded += 1;
                if !on_item(ResultItem::value(item)) {
                    return Ok(());
                }
            }

            match self.operation.paging {
                PagingKind::Token => match response.get("NextPageToken").and_then(Value::as_str) {
                    Some(token) => page_request = PageRequest::Token(Some(token.to_string())),
                    None => return Ok(()),
                },
                PagingKind::FirstItem => {
                    let has_more = response.get("HasMoreItems").and_then(Value::as_bool).unwrap_or(false);
                    if !has_more {
                        return Ok(());
                    }
                    page_request = PageRequest::FirstItem(yielded);
                }
                PagingKind::None => return Ok(()),
            }
        }
        tracing::warn!(operation = %self.operation.name, max_pages = MAX_PAGES, "stopped paginating at the page cap");
        Ok(())
    }

    /// Convenience collector over [`read_paginated`] for callers (tests,
    /// the non-streaming formatters) that need the whole result set at
    /// once rather than pushed incrementally.
    pub fn collect_all(&self, request: Value) -> Result<Vec<ResultItem>> {
        let mut items = Vec::new();
        self.read_paginated(request, |item| {
            items.push(item);
            true
        })?;
        Ok(items)
    }
}

fn apply_page_request(request: &mut Value, page_request: &PageRequest) {
    if !request.is_object() {
        *request = json!({});
    }
    let obj = request.as_object_mut().expect("ensured object");
    match page_request {
        PageRequest::Token(Some(token)) => {
            obj.insert("NextPageToken".to_string(), json!(token));
        }
        PageRequest::Token(None) => {
            obj.remove("NextPageToken");
        }
        PageRequest::FirstItem(n) => {
            obj.insert("FirstItem".to_string(), json!(n));
        }
        PageRequest::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octl_client::descriptor;

    #[test]
    fn reads_all_pages_of_token_paginated_volumes() {
        let cloud = FakeCloud::new();
        for _ in 0..5 {
            cloud.call("CreateVolume", &json!({"SubregionName": "eu-west-2a", "Size": 1})).unwrap();
        }
        let op = descriptor::by_name("ReadVolumes").unwrap();
        let reader = PageReader::new(&cloud, &op);
        let items = reader.collect_all(json!({})).unwrap();
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|i| !i.is_error()));
    }

    #[test]
    fn reads_all_pages_of_first_item_paginated_vms() {
        let cloud = FakeCloud::new();
        for _ in 0..5 {
            cloud.call("CreateVms", &json!({"ImageId": "ami-1"})).unwrap();
        }
        let op = descriptor::by_name("ReadVms").unwrap();
        let reader = PageReader::new(&cloud, &op);
        let items = reader.collect_all(json!({})).unwrap();
        assert_eq!(items.len(), 5);
    }

    #[test]
    fn early_stop_halts_before_exhausting_pages() {
        let cloud = FakeCloud::new();
        for _ in 0..5 {
            cloud.call("CreateVolume", &json!({"SubregionName": "eu-west-2a", "Size": 1})).unwrap();
        }
        let op = descriptor::by_name("ReadVolumes").unwrap();
        let reader = PageReader::new(&cloud, &op);
        let mut seen = 0;
        reader
            .read_paginated(json!({}), |_| {
                seen += 1;
                seen < 2
            })
            .unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn remote_error_surfaces_as_error_result_item() {
        let cloud = FakeCloud::new();
        let op = descriptor::by_name("UpdateVolume").unwrap();
        let reader = PageReader::new(&cloud, &op);
        let item = reader.read_raw(&json!({"VolumeId": "vol-missing"}));
        assert!(item.is_error());
    }
}
