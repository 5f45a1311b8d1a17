//! Common test fixture shared across integration tests.
#![cfg(test)]
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestFixture {
    _temp_dir: TempDir,
    data_dir: PathBuf,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let data_dir = temp_dir.path().join(".octl");
        Self { _temp_dir: temp_dir, data_dir }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("octl").expect("failed to find octl binary");
        cmd.arg("--data-dir").arg(self.data_dir());
        cmd
    }
}
