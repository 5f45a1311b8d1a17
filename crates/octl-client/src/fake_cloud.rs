//! An in-process, deterministic stand-in for the out-of-scope "underlying
//! SDK's request execution" collaborator (§1 Non-goals list it as external;
//! §EXPANSION 1 provides this so the rest of the pipeline — paging,
//! filtering, formatting, alias re-entry — can be exercised end to end
//! without a network).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::path::Path;

const VOLUME_PAGE_SIZE: usize = 2;
const VM_PAGE_SIZE: usize = 2;

/// Holds every resource kind the descriptor table (§descriptor) knows how
/// to create, read, update or delete. Single-threaded, matching the
/// concurrency model (§5): no two calls are ever in flight at once.
pub struct FakeCloud {
    volumes: RefCell<Vec<Value>>,
    vms: RefCell<Vec<Value>>,
    nets: RefCell<Vec<Value>>,
    subnets: RefCell<Vec<Value>>,
    next_id: Cell<u64>,
}

impl Default for FakeCloud {
    fn default() -> Self {
        FakeCloud {
            volumes: RefCell::new(Vec::new()),
            vms: RefCell::new(Vec::new()),
            nets: RefCell::new(Vec::new()),
            subnets: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }
}

/// On-disk snapshot of a [`FakeCloud`]'s stores (§EXPANSION 1). A real
/// backend persists across invocations by virtue of being remote; this
/// fake stands in for that persistence by round-tripping its state through
/// a plain JSON file under the data directory, so a chained pair of
/// separate `octl` invocations (§8 scenario 5) sees the same resources a
/// real API call would have left behind.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CloudState {
    #[serde(default)]
    volumes: Vec<Value>,
    #[serde(default)]
    vms: Vec<Value>,
    #[serde(default)]
    nets: Vec<Value>,
    #[serde(default)]
    subnets: Vec<Value>,
    #[serde(default = "default_next_id")]
    next_id: u64,
}

fn default_next_id() -> u64 {
    1
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_state(state: CloudState) -> Self {
        FakeCloud {
            volumes: RefCell::new(state.volumes),
            vms: RefCell::new(state.vms),
            nets: RefCell::new(state.nets),
            subnets: RefCell::new(state.subnets),
            next_id: Cell::new(state.next_id),
        }
    }

    fn snapshot(&self) -> CloudState {
        CloudState {
            volumes: self.volumes.borrow().clone(),
            vms: self.vms.borrow().clone(),
            nets: self.nets.borrow().clone(),
            subnets: self.subnets.borrow().clone(),
            next_id: self.next_id.get(),
        }
    }

    /// Loads a previously saved snapshot from `path`, or a fresh, empty
    /// cloud if none exists yet (first invocation in a data directory).
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .map(FakeCloud::from_state)
            .unwrap_or_default()
    }

    /// Writes the current state to `path`, creating its parent directory
    /// if needed (§6 data directory layout).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        format!("{prefix}-{id:08x}")
    }

    /// Dispatches one call by operation name. The Page Reader (in
    /// `octl-engine`) is responsible for looping this across pages; each
    /// call here is a single request/response round trip.
    pub fn call(&self, operation: &str, request: &Value) -> Result<Value> {
        tracing::debug!(operation, %request, "calling fake cloud backend");
        let result = match operation {
            "ReadVolumes" => Ok(self.read_volumes(request)),
            "CreateVolume" => self.create_volume(request),
            "UpdateVolume" => self.update_volume(request),
            "DeleteVolume" => self.delete_volume(request),
            "ReadVms" => Ok(self.read_vms(request)),
            "CreateVms" => self.create_vms(request),
            "CreateNet" => Ok(self.create_net(request)),
            "CreateSubnet" => self.create_subnet(request),
            other => Err(Error::UnknownOperation(other.to_string())),
        };
        if let Err(err) = &result {
            tracing::warn!(operation, %err, "fake cloud backend call failed");
        }
        result
    }

    fn read_volumes(&self, request: &Value) -> Value {
        let volumes = self.volumes.borrow();
        let filtered: Vec<&Value> = volumes
            .iter()
            .filter(|v| matches_string_filter(request, "VolumeTypes", v, "VolumeType"))
            .filter(|v| matches_string_filter(request, "VolumeIds", v, "VolumeId"))
            .collect();

        let offset = decode_token(request.get("NextPageToken"));
        let page: Vec<Value> = filtered
            .iter()
            .skip(offset)
            .take(VOLUME_PAGE_SIZE)
            .map(|v| (*v).clone())
            .collect();
        let next_offset = offset + page.len();
        let next_token = if next_offset < filtered.len() {
            Some(encode_token(next_offset))
        } else {
            None
        };

        let mut response = json!({
            "Volumes": page,
            "ResponseContext": {"RequestId": self.fresh_id("req")},
        });
        if let Some(token) = next_token {
            response["NextPageToken"] = json!(token);
        }
        response
    }

    fn create_volume(&self, request: &Value) -> Result<Value> {
        let size = request
            .get("Size")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::Validation("Size is required".to_string()))?;
        let subregion = request
            .get("SubregionName")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("SubregionName is required".to_string()))?;
        let volume = json!({
            "VolumeId": self.fresh_id("vol"),
            "VolumeType": request.get("VolumeType").cloned().unwrap_or(json!("standard")),
            "Size": size,
            "State": "creating",
            "SubregionName": subregion,
            "Tags": [],
        });
        self.volumes.borrow_mut().push(volume.clone());
        Ok(json!({ "Volume": volume }))
    }

    fn update_volume(&self, request: &Value) -> Result<Value> {
        let id = request
            .get("VolumeId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("VolumeId is required".to_string()))?;
        let mut volumes = self.volumes.borrow_mut();
        let volume = volumes
            .iter_mut()
            .find(|v| v.get("VolumeId").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| Error::NotFound {
                kind: "volume",
                id: id.to_string(),
            })?;
        if let Some(volume_type) = request.get("VolumeType") {
            volume["VolumeType"] = volume_type.clone();
        }
        if let Some(size) = request.get("Size") {
            volume["Size"] = size.clone();
        }
        Ok(json!({ "Volume": volume.clone() }))
    }

    fn delete_volume(&self, request: &Value) -> Result<Value> {
        let id = request
            .get("VolumeId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("VolumeId is required".to_string()))?;
        let mut volumes = self.volumes.borrow_mut();
        let before = volumes.len();
        volumes.retain(|v| v.get("VolumeId").and_then(Value::as_str) != Some(id));
        if volumes.len() == before {
            return Err(Error::NotFound {
                kind: "volume",
                id: id.to_string(),
            });
        }
        Ok(json!({ "ResponseContext": {"RequestId": self.fresh_id("req")} }))
    }

    fn read_vms(&self, request: &Value) -> Value {
        let vms = self.vms.borrow();
        let filtered: Vec<&Value> = vms
            .iter()
            .filter(|v| matches_string_filter(request, "VmIds", v, "VmId"))
            .collect();

        let offset = request
            .get("FirstItem")
            .and_then(Value::as_i64)
            .unwrap_or(0)
            .max(0) as usize;
        let page: Vec<Value> = filtered
            .iter()
            .skip(offset)
            .take(VM_PAGE_SIZE)
            .map(|v| (*v).clone())
            .collect();
        let has_more = offset + page.len() < filtered.len();

        json!({ "Vms": page, "HasMoreItems": has_more })
    }

    fn create_vms(&self, request: &Value) -> Result<Value> {
        let image_id = request
            .get("ImageId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("ImageId is required".to_string()))?;
        let vm = json!({
            "VmId": self.fresh_id("vm"),
            "VmType": request.get("VmType").cloned().unwrap_or(json!("t2.micro")),
            "State": "pending",
            "BlockDeviceMappings": request.get("BlockDeviceMappings").cloned().unwrap_or(json!([])),
        });
        let _ = image_id;
        self.vms.borrow_mut().push(vm.clone());
        Ok(json!({ "Vms": [vm] }))
    }

    fn create_net(&self, request: &Value) -> Value {
        let net = json!({
            "NetId": self.fresh_id("net"),
            "IpRange": request.get("IpRange").cloned().unwrap_or(Value::Null),
            "State": "available",
        });
        self.nets.borrow_mut().push(net.clone());
        json!({ "Net": net })
    }

    fn create_subnet(&self, request: &Value) -> Result<Value> {
        let net_id = request
            .get("NetId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("NetId is required".to_string()))?;
        if !self
            .nets
            .borrow()
            .iter()
            .any(|n| n.get("NetId").and_then(Value::as_str) == Some(net_id))
        {
            return Err(Error::NotFound {
                kind: "net",
                id: net_id.to_string(),
            });
        }
        let subnet = json!({
            "SubnetId": self.fresh_id("subnet"),
            "NetId": net_id,
            "IpRange": request.get("IpRange").cloned().unwrap_or(Value::Null),
            "SubregionName": request.get("SubregionName").cloned().unwrap_or(Value::Null),
            "State": "available",
        });
        self.subnets.borrow_mut().push(subnet.clone());
        Ok(json!({ "Subnet": subnet }))
    }
}

fn matches_string_filter(request: &Value, filter_field: &str, item: &Value, item_field: &str) -> bool {
    let Some(wanted) = request
        .get("Filters")
        .and_then(|f| f.get(filter_field))
        .and_then(Value::as_array)
    else {
        return true;
    };
    if wanted.is_empty() {
        return true;
    }
    let Some(actual) = item.get(item_field).and_then(Value::as_str) else {
        return false;
    };
    wanted.iter().any(|v| v.as_str() == Some(actual))
}

fn decode_token(token: Option<&Value>) -> usize {
    token
        .and_then(Value::as_str)
        .and_then(|s| s.strip_prefix("page:"))
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn encode_token(offset: usize) -> String {
    format!("page:{offset}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_preserves_resources_and_id_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud_state.json");

        let cloud = FakeCloud::new();
        let net = cloud.call("CreateNet", &json!({"IpRange": "10.0.0.0/16"})).unwrap();
        let net_id = net["Net"]["NetId"].as_str().unwrap().to_string();
        cloud.save(&path).expect("save");

        let reloaded = FakeCloud::load(&path);
        let subnet = reloaded
            .call(
                "CreateSubnet",
                &json!({"NetId": net_id, "IpRange": "10.0.1.0/24", "SubregionName": "eu-west-2a"}),
            )
            .expect("the net created before saving is still there after loading");
        assert_eq!(subnet["Subnet"]["NetId"], json!(net_id));
    }

    #[test]
    fn loading_a_missing_path_yields_an_empty_cloud() {
        let dir = tempfile::tempdir().unwrap();
        let cloud = FakeCloud::load(&dir.path().join("absent.json"));
        let listed = cloud.call("ReadVolumes", &json!({})).unwrap();
        assert!(listed["Volumes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn create_then_read_volume_round_trips() {
        let cloud = FakeCloud::new();
        let created = cloud
            .call("CreateVolume", &json!({"SubregionName": "eu-west-2a", "Size": 4, "VolumeType": "standard"}))
            .expect("create");
        assert_eq!(created["Volume"]["VolumeType"], json!("standard"));
        assert_eq!(created["Volume"]["Size"], json!(4));

        let listed = cloud.call("ReadVolumes", &json!({})).expect("read");
        assert_eq!(listed["Volumes"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn read_volumes_paginates_by_token() {
        let cloud = FakeCloud::new();
        for _ in 0..5 {
            cloud
                .call("CreateVolume", &json!({"SubregionName": "eu-west-2a", "Size": 1}))
                .unwrap();
        }
        let first = cloud.call("ReadVolumes", &json!({})).unwrap();
        assert_eq!(first["Volumes"].as_array().unwrap().len(), VOLUME_PAGE_SIZE);
        let token = first["NextPageToken"].as_str().unwrap().to_string();

        let second = cloud
            .call("ReadVolumes", &json!({"NextPageToken": token}))
            .unwrap();
        assert_eq!(second["Volumes"].as_array().unwrap().len(), VOLUME_PAGE_SIZE);

        let third_token = second["NextPageToken"].as_str().unwrap().to_string();
        let third = cloud
            .call("ReadVolumes", &json!({"NextPageToken": third_token}))
            .unwrap();
        assert_eq!(third["Volumes"].as_array().unwrap().len(), 1);
        assert!(third.get("NextPageToken").is_none());
    }

    #[test]
    fn delete_missing_volume_fails() {
        let cloud = FakeCloud::new();
        let err = cloud
            .call("DeleteVolume", &json!({"VolumeId": "vol-nope"}))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn create_subnet_requires_existing_net() {
        let cloud = FakeCloud::new();
        let net = cloud.call("CreateNet", &json!({"IpRange": "10.0.0.0/16"})).unwrap();
        let net_id = net["Net"]["NetId"].as_str().unwrap().to_string();

        let subnet = cloud
            .call(
                "CreateSubnet",
                &json!({"NetId": net_id, "IpRange": "10.0.1.0/24", "SubregionName": "eu-west-2a"}),
            )
            .unwrap();
        assert_eq!(subnet["Subnet"]["NetId"], json!(net_id));

        let err = cloud
            .call("CreateSubnet", &json!({"NetId": "net-missing", "IpRange": "10.0.1.0/24"}))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
