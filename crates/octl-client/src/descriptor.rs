//! The build-time descriptor table (§9 Design Notes, §EXPANSION 1).
//!
//! Stands in for a runtime `reflect.Type` walk over a typed SDK client:
//! each [`Operation`] here is what such a walk would discover by
//! reflecting on a client method's signature. Written by hand against the
//! same OpenAPI document the Schema View reads, covering the eight
//! operations the Testable Properties (§8) exercise.

use octl_types::field::{FieldDef, FieldShape, ScalarKind};
use octl_types::operation::{Operation, PagingKind};

fn scalar(kind: ScalarKind) -> FieldShape {
    FieldShape::Scalar {
        kind,
        allowed_values: Vec::new(),
    }
}

fn enum_scalar(values: &[&str]) -> FieldShape {
    FieldShape::Scalar {
        kind: ScalarKind::String,
        allowed_values: values.iter().map(|v| v.to_string()).collect(),
    }
}

fn field(name: &str, shape: FieldShape, required: bool) -> FieldDef {
    FieldDef::new(name, shape, required)
}

fn resource_tag() -> FieldShape {
    FieldShape::record(
        "ResourceTag",
        vec![
            field("Key", scalar(ScalarKind::String), true),
            field("Value", scalar(ScalarKind::String), true),
        ],
    )
}

fn response_context() -> FieldDef {
    field(
        "ResponseContext",
        FieldShape::record(
            "ResponseContext",
            vec![field("RequestId", scalar(ScalarKind::String), false)],
        ),
        false,
    )
}

fn volume_shape() -> FieldShape {
    FieldShape::record(
        "Volume",
        vec![
            field("VolumeId", scalar(ScalarKind::String), false),
            field("VolumeType", enum_scalar(&["standard", "gp2", "io1"]), false),
            field("Size", scalar(ScalarKind::Int), false),
            field(
                "State",
                enum_scalar(&["creating", "available", "in-use", "deleting", "error"]),
                false,
            ),
            field("SubregionName", scalar(ScalarKind::String), false),
            field(
                "Tags",
                FieldShape::SliceOfRecord {
                    element: Box::new(resource_tag()),
                },
                false,
            ),
        ],
    )
}

/// `ReadVolumes`: token-paged list, exercises scenarios 2–4 of §8.
pub fn read_volumes() -> Operation {
    let filters = field(
        "Filters",
        FieldShape::record(
            "FiltersVolume",
            vec![
                field(
                    "VolumeIds",
                    FieldShape::SliceOfScalar {
                        kind: ScalarKind::String,
                    },
                    false,
                ),
                field(
                    "VolumeTypes",
                    FieldShape::SliceOfScalar {
                        kind: ScalarKind::String,
                    },
                    false,
                ),
            ],
        ),
        false,
    );
    let next_page_token = field("NextPageToken", scalar(ScalarKind::String), false);
    Operation {
        name: "ReadVolumes".to_string(),
        group: "storage".to_string(),
        input: FieldShape::record("ReadVolumesRequest", vec![filters, next_page_token.clone()]),
        output: FieldShape::record(
            "ReadVolumesResponse",
            vec![
                field(
                    "Volumes",
                    FieldShape::SliceOfRecord {
                        element: Box::new(volume_shape()),
                    },
                    false,
                ),
                next_page_token,
                response_context(),
            ],
        ),
        paging: PagingKind::Token,
        content_field: Some("Volumes".to_string()),
    }
}

/// `CreateVolume`: scenario 1 of §8.
pub fn create_volume() -> Operation {
    Operation {
        name: "CreateVolume".to_string(),
        group: "storage".to_string(),
        input: FieldShape::record(
            "CreateVolumeRequest",
            vec![
                field("SubregionName", scalar(ScalarKind::String), true),
                field("Size", scalar(ScalarKind::Int), true),
                field("VolumeType", enum_scalar(&["standard", "gp2", "io1"]), false),
                field("Iops", scalar(ScalarKind::Int), false),
                field("SnapshotId", scalar(ScalarKind::String), false),
            ],
        ),
        output: FieldShape::record("CreateVolumeResponse", vec![field("Volume", volume_shape(), false)]),
        paging: PagingKind::None,
        content_field: None,
    }
}

pub fn update_volume() -> Operation {
    Operation {
        name: "UpdateVolume".to_string(),
        group: "storage".to_string(),
        input: FieldShape::record(
            "UpdateVolumeRequest",
            vec![
                field("VolumeId", scalar(ScalarKind::String), true),
                field("VolumeType", enum_scalar(&["standard", "gp2", "io1"]), false),
                field("Size", scalar(ScalarKind::Int), false),
            ],
        ),
        output: FieldShape::record("UpdateVolumeResponse", vec![field("Volume", volume_shape(), false)]),
        paging: PagingKind::None,
        content_field: None,
    }
}

pub fn delete_volume() -> Operation {
    Operation {
        name: "DeleteVolume".to_string(),
        group: "storage".to_string(),
        input: FieldShape::record(
            "DeleteVolumeRequest",
            vec![field("VolumeId", scalar(ScalarKind::String), true)],
        ),
        output: FieldShape::record("DeleteVolumeResponse", vec![response_context()]),
        paging: PagingKind::None,
        content_field: None,
    }
}

fn bsu_to_create() -> FieldShape {
    FieldShape::record(
        "BsuToCreate",
        vec![
            field("DeleteOnVmDeletion", scalar(ScalarKind::Bool), false),
            field("SnapshotId", scalar(ScalarKind::String), false),
            field("VolumeType", enum_scalar(&["standard", "gp2", "io1"]), false),
        ],
    )
}

fn block_device_mapping() -> FieldShape {
    FieldShape::record(
        "BlockDeviceMapping",
        vec![
            field("DeviceName", scalar(ScalarKind::String), false),
            field("Bsu", bsu_to_create(), false),
        ],
    )
}

fn vm_shape() -> FieldShape {
    FieldShape::record(
        "Vm",
        vec![
            field("VmId", scalar(ScalarKind::String), false),
            field("VmType", scalar(ScalarKind::String), false),
            field(
                "State",
                enum_scalar(&["pending", "running", "stopping", "stopped", "terminated"]),
                false,
            ),
            field(
                "BlockDeviceMappings",
                FieldShape::SliceOfRecord {
                    element: Box::new(block_device_mapping()),
                },
                false,
            ),
        ],
    )
}

/// `ReadVms`: first-item-paged list, exercises the `BlockDeviceMappings`
/// index-visibility property of §8.
pub fn read_vms() -> Operation {
    let filters = field(
        "Filters",
        FieldShape::record(
            "FiltersVm",
            vec![field(
                "VmIds",
                FieldShape::SliceOfScalar {
                    kind: ScalarKind::String,
                },
                false,
            )],
        ),
        false,
    );
    let first_item = field("FirstItem", scalar(ScalarKind::Int), false);
    Operation {
        name: "ReadVms".to_string(),
        group: "compute".to_string(),
        input: FieldShape::record("ReadVmsRequest", vec![filters, first_item]),
        output: FieldShape::record(
            "ReadVmsResponse",
            vec![
                field(
                    "Vms",
                    FieldShape::SliceOfRecord {
                        element: Box::new(vm_shape()),
                    },
                    false,
                ),
                field("HasMoreItems", scalar(ScalarKind::Bool), false),
            ],
        ),
        paging: PagingKind::FirstItem,
        content_field: Some("Vms".to_string()),
    }
}

/// `CreateVms`: carries the nested `BlockDeviceMappings` slice the flag
/// synthesizer's index-visibility test (§8) exercises on a *request*.
pub fn create_vms() -> Operation {
    Operation {
        name: "CreateVms".to_string(),
        group: "compute".to_string(),
        input: FieldShape::record(
            "CreateVmsRequest",
            vec![
                field("ImageId", scalar(ScalarKind::String), true),
                field("VmType", scalar(ScalarKind::String), false),
                field(
                    "BlockDeviceMappings",
                    FieldShape::SliceOfRecord {
                        element: Box::new(block_device_mapping()),
                    },
                    false,
                ),
            ],
        ),
        output: FieldShape::record(
            "CreateVmsResponse",
            vec![field(
                "Vms",
                FieldShape::SliceOfRecord {
                    element: Box::new(vm_shape()),
                },
                false,
            )],
        ),
        paging: PagingKind::None,
        content_field: Some("Vms".to_string()),
    }
}

/// `CreateNet`: first half of the chaining scenario (§8 scenario 5).
pub fn create_net() -> Operation {
    Operation {
        name: "CreateNet".to_string(),
        group: "network".to_string(),
        input: FieldShape::record(
            "CreateNetRequest",
            vec![field("IpRange", scalar(ScalarKind::String), true)],
        ),
        output: FieldShape::record(
            "CreateNetResponse",
            vec![field(
                "Net",
                FieldShape::record(
                    "Net",
                    vec![
                        field("NetId", scalar(ScalarKind::String), false),
                        field("IpRange", scalar(ScalarKind::String), false),
                        field("State", enum_scalar(&["pending", "available"]), false),
                    ],
                ),
                false,
            )],
        ),
        paging: PagingKind::None,
        content_field: None,
    }
}

/// `CreateSubnet`: consumes the prior response's `{{.Net.NetId}}` via the
/// Request Builder's template substitution (§8 scenario 5).
pub fn create_subnet() -> Operation {
    Operation {
        name: "CreateSubnet".to_string(),
        group: "network".to_string(),
        input: FieldShape::record(
            "CreateSubnetRequest",
            vec![
                field("NetId", scalar(ScalarKind::String), true),
                field("IpRange", scalar(ScalarKind::String), true),
                field("SubregionName", scalar(ScalarKind::String), false),
            ],
        ),
        output: FieldShape::record(
            "CreateSubnetResponse",
            vec![field(
                "Subnet",
                FieldShape::record(
                    "Subnet",
                    vec![
                        field("SubnetId", scalar(ScalarKind::String), false),
                        field("NetId", scalar(ScalarKind::String), false),
                        field("IpRange", scalar(ScalarKind::String), false),
                        field("SubregionName", scalar(ScalarKind::String), false),
                        field("State", enum_scalar(&["pending", "available"]), false),
                    ],
                ),
                false,
            )],
        ),
        paging: PagingKind::None,
        content_field: None,
    }
}

/// All descriptors, in declaration order. The Command Builder (`octl-cli`)
/// walks this to assemble the `api` command tree.
pub fn all() -> Vec<Operation> {
    vec![
        read_volumes(),
        create_volume(),
        update_volume(),
        delete_volume(),
        read_vms(),
        create_vms(),
        create_net(),
        create_subnet(),
    ]
}

pub fn by_name(name: &str) -> Option<Operation> {
    all().into_iter().find(|op| op.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_eight_operations_are_present() {
        let ops = all();
        assert_eq!(ops.len(), 8);
    }

    #[test]
    fn read_vms_request_carries_block_device_mapping_slice() {
        let op = create_vms();
        let fields = op.input_fields();
        let bdm = fields
            .iter()
            .find(|f| f.name == "BlockDeviceMappings")
            .expect("BlockDeviceMappings field");
        assert!(matches!(bdm.shape, FieldShape::SliceOfRecord { .. }));
    }

    #[test]
    fn by_name_finds_known_operation() {
        assert!(by_name("ReadVolumes").is_some());
        assert!(by_name("Nonexistent").is_none());
    }
}
