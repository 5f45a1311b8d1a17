//! End-to-end coverage of the literal scenarios the rest of the crate's
//! unit tests were written against: a real `octl` binary invocation over
//! a throwaway data directory, instead of calling the engine/flag/config
//! layers directly.

mod support;

use predicates::prelude::*;
use serde_json::Value;
use support::TestFixture;

#[test]
fn vol_create_reports_the_requested_type_and_size() {
    let fixture = TestFixture::new();
    let output = fixture
        .command()
        .args([
            "iaas",
            "vol",
            "create",
            "--subregion-name",
            "eu-west-2a",
            "--size",
            "4",
            "--volume-type",
            "standard",
            "-o",
            "json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let body: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(body["Volume"]["VolumeType"], "standard");
    assert_eq!(body["Volume"]["Size"], 4);
}

#[test]
fn api_read_volumes_with_a_type_filter_returns_only_matching_volumes() {
    let fixture = TestFixture::new();
    fixture
        .command()
        .args(["iaas", "vol", "create", "--subregion-name", "eu-west-2a", "--size", "1", "--volume-type", "standard"])
        .assert()
        .success();
    fixture
        .command()
        .args(["iaas", "vol", "create", "--subregion-name", "eu-west-2a", "--size", "1", "--volume-type", "io1"])
        .assert()
        .success();

    let output = fixture
        .command()
        .args(["iaas", "api", "ReadVolumes", "--filters.volume-types", "standard"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let body: Value = serde_json::from_slice(&output).expect("valid json");
    let volumes = body["Volumes"].as_array().expect("Volumes array");
    assert!(!volumes.is_empty());
    assert!(volumes.iter().all(|v| v["VolumeType"] == "standard"));
    assert!(!body["ResponseContext"]["RequestId"].as_str().unwrap_or("").is_empty());
}

#[test]
fn field_filter_shortcut_desugars_to_a_select_test_predicate() {
    let fixture = TestFixture::new();
    fixture
        .command()
        .args(["iaas", "vol", "create", "--subregion-name", "eu-west-2a", "--size", "1", "--volume-type", "standard"])
        .assert()
        .success();
    fixture
        .command()
        .args(["iaas", "vol", "create", "--subregion-name", "eu-west-2a", "--size", "1", "--volume-type", "io1"])
        .assert()
        .success();

    let output = fixture
        .command()
        .args(["iaas", "api", "ReadVolumes", "--filter", "VolumeType:standard", "-o", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let body: Value = serde_json::from_slice(&output).expect("valid json");
    let volumes = body.as_array().expect("a plain array, not a raw response");
    assert!(!volumes.is_empty());
    assert!(volumes.iter().all(|v| v["VolumeType"] == "standard"));
}

#[test]
fn jq_flag_projects_a_single_field_out_of_each_item() {
    let fixture = TestFixture::new();
    fixture
        .command()
        .args(["iaas", "vol", "create", "--subregion-name", "eu-west-2a", "--size", "1", "--volume-type", "standard"])
        .assert()
        .success();

    let output = fixture
        .command()
        .args([
            "iaas",
            "api",
            "ReadVolumes",
            "--jq",
            ".VolumeType",
            "--filters.volume-types",
            "standard",
            "-o",
            "json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let body: Value = serde_json::from_slice(&output).expect("valid json");
    let values = body.as_array().expect("array of projected values");
    assert!(!values.is_empty());
    assert!(values.iter().all(|v| v == "standard"));
}

#[test]
fn chained_create_net_and_create_subnet_substitutes_the_piped_net_id() {
    let fixture = TestFixture::new();
    let net_output = fixture
        .command()
        .args(["iaas", "api", "CreateNet", "--ip-range", "10.0.0.0/16", "-o", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let mut subnet_cmd = fixture.command();
    subnet_cmd
        .args([
            "iaas",
            "api",
            "CreateSubnet",
            "--net-id",
            "{{.Net.NetId}}",
            "--ip-range",
            "10.0.1.0/24",
            "-o",
            "json",
        ])
        .write_stdin(net_output);

    let subnet_output = subnet_cmd.assert().success().get_output().stdout.clone();
    let body: Value = serde_json::from_slice(&subnet_output).expect("valid json");
    assert!(!body["Subnet"]["SubnetId"].as_str().unwrap_or("").is_empty());
}

#[test]
fn vol_delete_with_yes_flag_skips_the_confirmation_prompt() {
    let fixture = TestFixture::new();
    let create_output = fixture
        .command()
        .args(["iaas", "vol", "create", "--subregion-name", "eu-west-2a", "--size", "1", "-o", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let body: Value = serde_json::from_slice(&create_output).expect("valid json");
    let volume_id = body["Volume"]["VolumeId"].as_str().expect("VolumeId").to_string();

    fixture
        .command()
        .args(["iaas", "vol", "delete", &volume_id, "-y"])
        .assert()
        .success();

    let listed = fixture
        .command()
        .args(["iaas", "api", "ReadVolumes", "-o", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let listed_body: Value = serde_json::from_slice(&listed).expect("valid json");
    let volumes = listed_body.as_array().expect("array of volumes");
    assert!(volumes.iter().all(|v| v["VolumeId"] != volume_id));
}

#[test]
fn vol_delete_without_yes_prompts_and_aborts_on_a_closed_stdin() {
    let fixture = TestFixture::new();
    let create_output = fixture
        .command()
        .args(["iaas", "vol", "create", "--subregion-name", "eu-west-2a", "--size", "1", "-o", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let body: Value = serde_json::from_slice(&create_output).expect("valid json");
    let volume_id = body["Volume"]["VolumeId"].as_str().expect("VolumeId").to_string();

    let mut cmd = fixture.command();
    cmd.args(["iaas", "vol", "delete", &volume_id]).write_stdin("");
    cmd.assert().success().stderr(predicate::str::contains("aborted"));
}

#[test]
fn first_block_device_mapping_index_is_visible_without_reference_the_second_is_not() {
    let fixture = TestFixture::new();
    let help = fixture.command().args(["iaas", "api", "CreateVms", "--help"]).assert().success().get_output().stdout.clone();
    let help_text = String::from_utf8(help).expect("utf8 help text");

    assert!(help_text.contains("block-device-mappings.0"));
    assert!(!help_text.contains("block-device-mappings.1"));

    let help_with_reference = fixture
        .command()
        .args(["iaas", "api", "CreateVms", "--block-device-mappings.1.device-name", "/dev/sdb", "--help"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let help_with_reference_text = String::from_utf8(help_with_reference).expect("utf8 help text");
    assert!(help_with_reference_text.contains("block-device-mappings.1"));
}
